use std::path::{Path, PathBuf};
use std::sync::Arc;

use agenda_core::Agenda;
use anyhow::{Context, Result};

const DOCUMENT_FILE: &str = "agenda.xml";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    document_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(agenda: &Agenda) -> Result<Self> {
        let dir = agenda.data_path();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Could not create data directory {}", dir.display()))?;

        Ok(Self::at(dir.join(DOCUMENT_FILE)))
    }

    pub fn at(document_path: impl Into<PathBuf>) -> Self {
        AppState {
            document_path: Arc::new(document_path.into()),
        }
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }
}
