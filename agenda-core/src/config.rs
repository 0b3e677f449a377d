//! Global agenda configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};

static DEFAULT_DATA_DIR: &str = "~/agenda";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_SERVER_PORT: u16 = 4096;

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn is_default_data_dir(p: &PathBuf) -> bool {
    *p == default_data_dir()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

/// Where the shared agenda document lives.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RemoteSettings {
    /// A JSON document on a shared filesystem path.
    File { path: PathBuf },
    /// A JSON document fetched with GET and written with PUT.
    Http { url: String },
}

impl RemoteSettings {
    /// Interpret a command-line target: `http://` and `https://` URLs are
    /// HTTP documents, anything else is a file path.
    pub fn from_target(target: &str) -> AgendaResult<Self> {
        let target = target.trim();
        if target.is_empty() {
            return Err(AgendaError::Config("Remote target cannot be blank".into()));
        }

        let lower = target.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(RemoteSettings::Http {
                url: target.to_string(),
            })
        } else {
            Ok(RemoteSettings::File {
                path: PathBuf::from(target),
            })
        }
    }
}

/// Global configuration at ~/.config/agenda/config.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgendaConfig {
    #[serde(default = "default_data_dir", skip_serializing_if = "is_default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds a conflict dialog may stay unanswered before it is cancelled.
    /// Unset means it waits for as long as it takes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_timeout_secs: Option<u64>,

    #[serde(default = "default_server_port")]
    pub server_port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteSettings>,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        AgendaConfig {
            data_dir: default_data_dir(),
            remote: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            choice_timeout_secs: None,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl AgendaConfig {
    pub fn config_path() -> AgendaResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgendaError::Config("Could not determine config directory".into()))?
            .join("agenda");

        Ok(config_dir.join("config.toml"))
    }

    /// Save the config to `path`.
    pub fn save(&self, path: &Path) -> AgendaResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AgendaError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| AgendaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AgendaResult<()> {
        let contents = format!(
            "\
# agenda configuration

# Where the local agenda and sync state live:
# data_dir = \"{DEFAULT_DATA_DIR}\"

# The shared agenda document, either a file in a synced folder:
# remote = {{ kind = \"file\", path = \"~/Dropbox/agenda.json\" }}
# or a document URL:
# remote = {{ kind = \"http\", url = \"https://example.com/agenda/main.json\" }}

# Seconds between sync checks in watch mode:
# poll_interval_secs = {DEFAULT_POLL_INTERVAL_SECS}

# Cancel an unanswered conflict dialog after this many seconds:
# choice_timeout_secs = 600

# Port for agenda-server:
# server_port = {DEFAULT_SERVER_PORT}
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgendaError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AgendaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_target_urls_are_http() {
        assert_eq!(
            RemoteSettings::from_target("https://example.com/agenda.json").unwrap(),
            RemoteSettings::Http {
                url: "https://example.com/agenda.json".into()
            }
        );
        assert!(matches!(
            RemoteSettings::from_target(" HTTP://localhost:4096/doc ").unwrap(),
            RemoteSettings::Http { url } if url == "HTTP://localhost:4096/doc"
        ));
    }

    #[test]
    fn test_remote_target_paths_are_files() {
        assert_eq!(
            RemoteSettings::from_target("~/Dropbox/agenda.json").unwrap(),
            RemoteSettings::File {
                path: PathBuf::from("~/Dropbox/agenda.json")
            }
        );
    }

    #[test]
    fn test_blank_remote_target_is_rejected() {
        assert!(matches!(
            RemoteSettings::from_target("   "),
            Err(AgendaError::Config(_))
        ));
    }
}
