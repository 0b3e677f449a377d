//! Persistence: device key-value storage, the local agenda file and the
//! shared remote document.

mod agenda_store;
mod key_value;
mod remote;

use std::path::Path;

pub use agenda_store::{AgendaStore, LocalStore, MemoryLocalStore};
pub use key_value::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use remote::{DocumentMeta, FileRemoteStore, MemoryRemoteStore, RemoteDocument, RemoteStore};

/// Write `contents` to `path` through a sibling temp file and a rename, so
/// readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");

    std::fs::write(&temp, contents)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
