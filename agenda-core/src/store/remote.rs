//! The shared remote document.
//!
//! The remote store is an opaque document store: one JSON document at a
//! fixed path, fetched and overwritten whole. Besides the snapshot itself the
//! document carries a `_metadata` block naming the last writer.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{AgendaError, AgendaResult};
use crate::snapshot::AgendaSnapshot;
use crate::store::write_atomic;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub device_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteDocument {
    #[serde(flatten)]
    pub snapshot: AgendaSnapshot,
    #[serde(rename = "_metadata", skip_serializing_if = "Option::is_none")]
    pub document_meta: Option<DocumentMeta>,
}

impl RemoteDocument {
    pub fn new(snapshot: AgendaSnapshot) -> Self {
        let document_meta = snapshot.metadata.as_ref().map(|m| DocumentMeta {
            device_name: m.device_name.clone(),
            timestamp: m.timestamp,
        });

        RemoteDocument {
            snapshot,
            document_meta,
        }
    }
}

impl<'de> Deserialize<'de> for RemoteDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        // Split `_metadata` off by hand; the snapshot's key aliases do not
        // survive a flattened deserialize.
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let document_meta = match fields.remove("_metadata") {
            None | Some(Value::Null) => None,
            Some(meta) => Some(serde_json::from_value(meta).map_err(D::Error::custom)?),
        };
        let snapshot = serde_json::from_value(Value::Object(fields)).map_err(D::Error::custom)?;

        Ok(RemoteDocument {
            snapshot,
            document_meta,
        })
    }
}

pub trait RemoteStore {
    /// The current document, or `None` if nothing was ever written.
    fn fetch(&self) -> impl Future<Output = AgendaResult<Option<RemoteDocument>>> + Send;

    /// Overwrite the document.
    fn put(&self, document: &RemoteDocument) -> impl Future<Output = AgendaResult<()>> + Send;
}

/// A document in a shared folder (e.g. one kept in sync by a file-sync service).
pub struct FileRemoteStore {
    path: PathBuf,
}

impl FileRemoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileRemoteStore { path: path.into() }
    }
}

impl RemoteStore for FileRemoteStore {
    async fn fetch(&self) -> AgendaResult<Option<RemoteDocument>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AgendaError::Remote(format!(
                    "Could not read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let document = serde_json::from_str(&content).map_err(|e| {
            AgendaError::Remote(format!("Invalid document at {}: {e}", self.path.display()))
        })?;

        Ok(Some(document))
    }

    async fn put(&self, document: &RemoteDocument) -> AgendaResult<()> {
        let content = serde_json::to_string_pretty(document)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(|e| AgendaError::Remote(e.to_string()))?
            .map_err(|e| AgendaError::Remote(format!("Could not write {}: {e}", self.path.display())))
    }
}

/// In-memory remote store, for tests and embedding.
#[derive(Default)]
pub struct MemoryRemoteStore {
    document: Mutex<Option<RemoteDocument>>,
}

impl MemoryRemoteStore {
    pub fn new(document: Option<RemoteDocument>) -> Self {
        MemoryRemoteStore {
            document: Mutex::new(document),
        }
    }

    pub fn document(&self) -> Option<RemoteDocument> {
        self.document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn fetch(&self) -> AgendaResult<Option<RemoteDocument>> {
        Ok(self.document())
    }

    async fn put(&self, document: &RemoteDocument) -> AgendaResult<()> {
        *self
            .document
            .lock()
            .map_err(|_| AgendaError::Remote("remote lock poisoned".into()))? = Some(document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Item, SnapshotMetadata};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_document_wire_shape() {
        let timestamp = "2025-03-20T15:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let snapshot = AgendaSnapshot {
            tasks: vec![Item::new("1").with("titulo", "Buy milk")],
            ..Default::default()
        }
        .with_metadata(SnapshotMetadata {
            device_id: "dev-1".into(),
            device_name: "Firefox Desktop".into(),
            timestamp,
        });

        let wire = serde_json::to_value(RemoteDocument::new(snapshot)).unwrap();

        assert_eq!(wire["tasks"][0]["titulo"], "Buy milk");
        assert_eq!(wire["metadata"]["deviceId"], "dev-1");
        assert_eq!(wire["_metadata"]["deviceName"], "Firefox Desktop");
        assert_eq!(wire["_metadata"]["timestamp"], "2025-03-20T15:00:00Z");
    }

    #[test]
    fn test_document_from_web_client() {
        let document: RemoteDocument = serde_json::from_value(json!({
            "tareas": [{ "id": 1700000000000u64, "titulo": "Comprar pan" }],
            "notas": "",
            "metadata": {
                "deviceId": "a3c1",
                "deviceName": "Safari Mobile",
                "timestamp": "2025-03-20T15:00:00.000Z"
            },
            "_metadata": { "deviceName": "Safari Mobile", "timestamp": "2025-03-20T15:00:00.000Z" }
        }))
        .unwrap();

        assert_eq!(document.snapshot.tasks[0].id, "1700000000000");
        assert_eq!(document.snapshot.metadata.unwrap().device_name, "Safari Mobile");
        assert!(document.document_meta.is_some());
    }

    #[tokio::test]
    async fn test_file_remote_store() {
        let dir = TempDir::new().unwrap();
        let store = FileRemoteStore::new(dir.path().join("shared/agenda.json"));

        assert_eq!(store.fetch().await.unwrap(), None);

        let document = RemoteDocument::new(AgendaSnapshot {
            notes: "hello".into(),
            ..Default::default()
        });
        store.put(&document).await.unwrap();

        assert_eq!(store.fetch().await.unwrap(), Some(document));
    }

    #[tokio::test]
    async fn test_file_remote_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agenda.json");
        std::fs::write(&path, "<xml/>").unwrap();

        let result = FileRemoteStore::new(path).fetch().await;
        assert!(matches!(result, Err(AgendaError::Remote(_))));
    }
}
