//! The remote store selected in config.

use agenda_core::config::RemoteSettings;
use agenda_core::store::{FileRemoteStore, RemoteDocument, RemoteStore};
use agenda_core::{Agenda, AgendaResult};
use anyhow::Result;

use crate::client::HttpRemoteStore;

pub enum ConfiguredRemote {
    File(FileRemoteStore),
    Http(HttpRemoteStore),
}

impl ConfiguredRemote {
    pub fn from_agenda(agenda: &Agenda) -> Result<Self> {
        let Some(settings) = agenda.remote() else {
            anyhow::bail!(
                "No remote configured.\n\n\
                Add one to your config file:\n  \
                remote = {{ kind = \"file\", path = \"~/Dropbox/agenda.json\" }}\n\n\
                or:\n  \
                remote = {{ kind = \"http\", url = \"https://example.com/agenda.json\" }}"
            );
        };

        Ok(match settings {
            RemoteSettings::File { path } => ConfiguredRemote::File(FileRemoteStore::new(path)),
            RemoteSettings::Http { url } => ConfiguredRemote::Http(HttpRemoteStore::new(url)?),
        })
    }
}

impl RemoteStore for ConfiguredRemote {
    async fn fetch(&self) -> AgendaResult<Option<RemoteDocument>> {
        match self {
            ConfiguredRemote::File(store) => store.fetch().await,
            ConfiguredRemote::Http(store) => store.fetch().await,
        }
    }

    async fn put(&self, document: &RemoteDocument) -> AgendaResult<()> {
        match self {
            ConfiguredRemote::File(store) => store.put(document).await,
            ConfiguredRemote::Http(store) => store.put(document).await,
        }
    }
}
