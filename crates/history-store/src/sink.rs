//! External sinks for artifacts and export bundles

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::StoreError;
use crate::model::{ExportBundle, ExtractedArtifact};

pub trait ArtifactSink: Send + Sync {
    fn persist_artifact(&self, artifact: &ExtractedArtifact) -> Result<PathBuf, StoreError>;
    fn persist_export(&self, bundle: &ExportBundle) -> Result<PathBuf, StoreError>;
}

/// Writes pretty JSON files into a results directory.
#[derive(Clone, Debug)]
pub struct FsArtifactSink {
    root: PathBuf,
}

impl FsArtifactSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        let path = self.root.join(name);
        let body = serde_json::to_string_pretty(value)?;
        fs::write(&path, body).map_err(|err| StoreError::io(&path, err))?;
        Ok(path)
    }
}

impl ArtifactSink for FsArtifactSink {
    fn persist_artifact(&self, artifact: &ExtractedArtifact) -> Result<PathBuf, StoreError> {
        let path = self.write_json(&format!("{}.json", artifact.key), artifact)?;
        info!(key = %artifact.key, path = %path.display(), "extracted data saved");
        Ok(path)
    }

    fn persist_export(&self, bundle: &ExportBundle) -> Result<PathBuf, StoreError> {
        let name = format!("export_{}.json", bundle.export_timestamp.timestamp_millis());
        let path = self.write_json(&name, bundle)?;
        info!(path = %path.display(), records = bundle.execution_history.len(), "history exported");
        Ok(path)
    }
}
