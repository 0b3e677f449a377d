//! Device-scoped key-value storage.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{AgendaError, AgendaResult};
use crate::store::write_atomic;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> AgendaResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AgendaResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> AgendaResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> AgendaResult<()> {
        (**self).set(key, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> AgendaResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> AgendaResult<()> {
        (**self).set(key, value)
    }
}

/// A flat TOML table on disk, e.g. `~/.config/agenda/device.toml`.
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileKeyValueStore { path: path.into() }
    }

    /// Default location next to the global config file.
    pub fn default_path() -> AgendaResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgendaError::StorageUnavailable("Could not determine config directory".into()))?
            .join("agenda");

        Ok(config_dir.join("device.toml"))
    }

    fn read_table(&self) -> AgendaResult<toml::Table> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AgendaError::StorageUnavailable(format!("{}: {e}", self.path.display())))?;

        toml::from_str(&content)
            .map_err(|e| AgendaError::StorageUnavailable(format!("{}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> AgendaResult<Option<String>> {
        let table = self.read_table()?;
        Ok(table.get(key).and_then(|v| v.as_str()).map(String::from))
    }

    fn set(&self, key: &str, value: &str) -> AgendaResult<()> {
        let mut table = self.read_table()?;
        table.insert(key.to_string(), toml::Value::String(value.to_string()));

        let content = toml::to_string_pretty(&table)
            .map_err(|e| AgendaError::Serialization(e.to_string()))?;

        write_atomic(&self.path, &content)
            .map_err(|e| AgendaError::StorageUnavailable(format!("{}: {e}", self.path.display())))
    }
}

#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> AgendaResult<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| AgendaError::StorageUnavailable("storage lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AgendaResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| AgendaError::StorageUnavailable("storage lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
