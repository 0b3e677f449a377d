//! Keeps a single agenda-server per user: two servers writing the same
//! document would silently drop each other's saves.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Holds the lock until dropped.
pub struct LockGuard {
    _file: File,
}

fn lock_path() -> Result<PathBuf> {
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine runtime directory")?;

    Ok(runtime_dir.join("agenda").join("server.lock"))
}

/// Take the per-user lock, failing if another server holds it.
pub fn acquire_lock() -> Result<LockGuard> {
    acquire_lock_at(&lock_path()?)
}

fn acquire_lock_at(path: &Path) -> Result<LockGuard> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(path).context("Failed to create lock file")?;

    file.try_lock_exclusive().map_err(|_| {
        anyhow::anyhow!(
            "Another agenda-server instance is already running.\n\
            If you believe this is an error, remove: {}",
            path.display()
        )
    })?;

    Ok(LockGuard { _file: file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_lock_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agenda/server.lock");

        let first = acquire_lock_at(&path).unwrap();
        let err = acquire_lock_at(&path).err().unwrap();
        assert!(err.to_string().contains("already running"));

        drop(first);
        assert!(acquire_lock_at(&path).is_ok());
    }
}
