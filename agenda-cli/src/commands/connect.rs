use std::path::Path;

use agenda_core::Agenda;
use agenda_core::config::{AgendaConfig, RemoteSettings};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub fn run(agenda: &Agenda, target: &str) -> Result<()> {
    let config_path = AgendaConfig::config_path()?;
    let remote = connect(agenda, target, &config_path)?;

    let shown = match &remote {
        RemoteSettings::File { path } => path.display().to_string(),
        RemoteSettings::Http { url } => url.clone(),
    };
    println!("Syncing with {}", shown.bold());
    println!(
        "{}",
        format!("Saved to {}", config_path.display()).dimmed()
    );
    Ok(())
}

/// Point the config at `target` and write it to `config_path`.
fn connect(agenda: &Agenda, target: &str, config_path: &Path) -> Result<RemoteSettings> {
    let remote = match RemoteSettings::from_target(target)? {
        // Relative paths are relative to where the command ran, not to
        // wherever a later sync happens to run.
        RemoteSettings::File { path } if path.is_relative() && !path.starts_with("~") => {
            RemoteSettings::File {
                path: std::path::absolute(&path)
                    .with_context(|| format!("Could not resolve {}", path.display()))?,
            }
        }
        remote => remote,
    };

    let config = AgendaConfig {
        remote: Some(remote.clone()),
        ..agenda.config().clone()
    };
    config.save(config_path)?;

    Ok(remote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_connect_saves_http_remote() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let agenda = Agenda::from_config(AgendaConfig {
            poll_interval_secs: 15,
            ..Default::default()
        });

        connect(&agenda, "https://example.com/agenda.json", &path).unwrap();

        let reloaded = Agenda::load_from(&path).unwrap();
        assert_eq!(
            reloaded.remote(),
            Some(RemoteSettings::Http {
                url: "https://example.com/agenda.json".into()
            })
        );
        assert_eq!(reloaded.config().poll_interval_secs, 15);
    }

    #[test]
    fn test_connect_replaces_previous_remote_with_absolute_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let agenda = Agenda::from_config(AgendaConfig {
            remote: Some(RemoteSettings::Http {
                url: "http://localhost:4096/doc".into(),
            }),
            ..Default::default()
        });

        let remote = connect(&agenda, "shared/agenda.json", &path).unwrap();

        let RemoteSettings::File { path: saved } = remote else {
            panic!("expected a file remote, got {remote:?}");
        };
        assert!(saved.is_absolute());
        assert!(saved.ends_with("shared/agenda.json"));
        assert!(matches!(
            Agenda::load_from(&path).unwrap().remote(),
            Some(RemoteSettings::File { path }) if path == saved
        ));
    }

    #[test]
    fn test_connect_rejects_blank_target() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        assert!(connect(&Agenda::from_config(AgendaConfig::default()), " ", &path).is_err());
        assert!(!path.exists());
    }
}
