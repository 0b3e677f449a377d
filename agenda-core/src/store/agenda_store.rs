//! Local agenda state and sync bookkeeping.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AgendaError, AgendaResult};
use crate::identity::DeviceIdentityProvider;
use crate::snapshot::{AgendaSnapshot, SnapshotMetadata};
use crate::store::{KeyValueStore, write_atomic};

const AGENDA_FILE: &str = "agenda.json";
const LAST_SYNCED_FILE: &str = "last_synced.json";

/// Where the local snapshot and the provenance of the last sync are kept.
pub trait LocalStore {
    fn load(&self) -> AgendaResult<AgendaSnapshot>;
    fn save(&self, snapshot: &AgendaSnapshot) -> AgendaResult<()>;

    /// Provenance of the remote document as of the last completed sync.
    fn last_synced(&self) -> AgendaResult<Option<SnapshotMetadata>>;
    fn record_synced(&self, metadata: Option<&SnapshotMetadata>) -> AgendaResult<()>;

    /// Apply a local edit and stamp the result with this device's metadata.
    fn edit<S: KeyValueStore>(
        &self,
        identity: &DeviceIdentityProvider<S>,
        f: impl FnOnce(&mut AgendaSnapshot),
    ) -> AgendaResult<AgendaSnapshot> {
        let mut snapshot = self.load()?;
        f(&mut snapshot);
        snapshot.metadata = Some(identity.device_metadata().into());
        self.save(&snapshot)?;
        Ok(snapshot)
    }
}

/// File-backed local store rooted at the configured data directory.
///
/// ```text
/// <data_dir>/agenda.json
/// <data_dir>/.agenda/state/last_synced.json
/// ```
pub struct AgendaStore {
    dir: PathBuf,
}

impl AgendaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        AgendaStore { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(AGENDA_FILE)
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(".agenda/state").join(LAST_SYNCED_FILE)
    }
}

fn read_optional(path: &Path) -> AgendaResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl LocalStore for AgendaStore {
    fn load(&self) -> AgendaResult<AgendaSnapshot> {
        match read_optional(&self.path())? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(AgendaSnapshot::default()),
        }
    }

    fn save(&self, snapshot: &AgendaSnapshot) -> AgendaResult<()> {
        let content = serde_json::to_string_pretty(snapshot)?;
        write_atomic(&self.path(), &content)?;
        Ok(())
    }

    fn last_synced(&self) -> AgendaResult<Option<SnapshotMetadata>> {
        match read_optional(&self.state_path())? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(None),
        }
    }

    fn record_synced(&self, metadata: Option<&SnapshotMetadata>) -> AgendaResult<()> {
        let content = serde_json::to_string_pretty(&metadata)?;
        write_atomic(&self.state_path(), &content)?;
        Ok(())
    }
}

/// In-memory local store, for tests and embedding.
#[derive(Default)]
pub struct MemoryLocalStore {
    snapshot: Mutex<AgendaSnapshot>,
    last_synced: Mutex<Option<SnapshotMetadata>>,
}

impl MemoryLocalStore {
    pub fn new(snapshot: AgendaSnapshot, last_synced: Option<SnapshotMetadata>) -> Self {
        MemoryLocalStore {
            snapshot: Mutex::new(snapshot),
            last_synced: Mutex::new(last_synced),
        }
    }
}

fn poisoned<T>(_: T) -> AgendaError {
    AgendaError::StorageUnavailable("local store lock poisoned".into())
}

impl LocalStore for MemoryLocalStore {
    fn load(&self) -> AgendaResult<AgendaSnapshot> {
        Ok(self.snapshot.lock().map_err(poisoned)?.clone())
    }

    fn save(&self, snapshot: &AgendaSnapshot) -> AgendaResult<()> {
        *self.snapshot.lock().map_err(poisoned)? = snapshot.clone();
        Ok(())
    }

    fn last_synced(&self) -> AgendaResult<Option<SnapshotMetadata>> {
        Ok(self.last_synced.lock().map_err(poisoned)?.clone())
    }

    fn record_synced(&self, metadata: Option<&SnapshotMetadata>) -> AgendaResult<()> {
        *self.last_synced.lock().map_err(poisoned)? = metadata.cloned();
        Ok(())
    }
}
