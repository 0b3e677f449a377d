//! Agenda root: configuration plus the paths and stores derived from it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};

use crate::config::{AgendaConfig, RemoteSettings};
use crate::error::{AgendaError, AgendaResult};
use crate::store::{AgendaStore, FileKeyValueStore};

#[derive(Clone, Debug)]
pub struct Agenda {
    config: AgendaConfig,
}

impl Agenda {
    /// Load the global config, creating a commented default on first run.
    /// `AGENDA_*` environment variables override file values.
    pub fn load() -> AgendaResult<Self> {
        let config_path = AgendaConfig::config_path()?;

        if !config_path.exists() {
            AgendaConfig::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> AgendaResult<Self> {
        let config: AgendaConfig = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("AGENDA").try_parsing(true))
            .build()
            .map_err(|e| AgendaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AgendaError::Config(e.to_string()))?;

        Ok(Agenda { config })
    }

    pub fn from_config(config: AgendaConfig) -> Self {
        Agenda { config }
    }

    pub fn config(&self) -> &AgendaConfig {
        &self.config
    }

    pub fn data_path(&self) -> PathBuf {
        expand(&self.config.data_dir)
    }

    pub fn store(&self) -> AgendaStore {
        AgendaStore::new(self.data_path())
    }

    /// Device identity storage; falls back to the data directory when the
    /// platform has no config directory.
    pub fn device_store(&self) -> FileKeyValueStore {
        let path = FileKeyValueStore::default_path()
            .unwrap_or_else(|_| self.data_path().join(".agenda/device.toml"));
        FileKeyValueStore::new(path)
    }

    /// Remote settings with `~` expanded in file paths.
    pub fn remote(&self) -> Option<RemoteSettings> {
        self.config.remote.as_ref().map(|remote| match remote {
            RemoteSettings::File { path } => RemoteSettings::File { path: expand(path) },
            RemoteSettings::Http { url } => RemoteSettings::Http { url: url.clone() },
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs.max(1))
    }

    pub fn choice_timeout(&self) -> Option<Duration> {
        self.config.choice_timeout_secs.map(Duration::from_secs)
    }

    pub fn server_port(&self) -> u16 {
        self.config.server_port
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
