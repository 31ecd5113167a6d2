//! Download sinks
//!
//! A sink is the host's save mechanism: it accepts a finished artifact and
//! reports where it went. Directory saves go through a temporary file in the
//! target directory that is renamed into place, so a failed save never
//! leaves a partial document behind.

use crate::error::{Result, StoreError};
use export_model::{ArtifactDescriptor, ExportArtifact};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Host save/download mechanism
pub trait DownloadSink: Send + Sync {
    fn save(&self, artifact: ExportArtifact)
        -> impl Future<Output = Result<ArtifactDescriptor>> + Send;
}

/// Writes artifacts into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    async fn save(&self, artifact: ExportArtifact) -> Result<ArtifactDescriptor> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &artifact))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}

/// Reject names that would escape the output directory
fn validate_file_name(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

fn write_atomic(dir: &Path, artifact: &ExportArtifact) -> Result<ArtifactDescriptor> {
    validate_file_name(&artifact.file_name)?;
    if !dir.is_dir() {
        return Err(StoreError::MissingDirectory(dir.to_path_buf()));
    }

    let target = dir.join(&artifact.file_name);
    let save_error = |source| StoreError::Save {
        name: artifact.file_name.clone(),
        source,
    };

    // Dropping the temp file on any error path removes it
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(save_error)?;
    temp.write_all(&artifact.bytes).map_err(save_error)?;
    temp.as_file().sync_all().map_err(save_error)?;
    temp.persist(&target).map_err(|e| save_error(e.error))?;

    tracing::info!(
        path = %target.display(),
        bytes = artifact.len(),
        "saved artifact"
    );
    Ok(ArtifactDescriptor {
        name: artifact.file_name.clone(),
        byte_len: artifact.len(),
        location: Some(target),
    })
}

/// Keeps artifacts in memory, for tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<ExportArtifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far
    pub fn artifacts(&self) -> Vec<ExportArtifact> {
        self.artifacts
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().map(|list| list.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DownloadSink for MemorySink {
    async fn save(&self, artifact: ExportArtifact) -> Result<ArtifactDescriptor> {
        validate_file_name(&artifact.file_name)?;
        let descriptor = ArtifactDescriptor {
            name: artifact.file_name.clone(),
            byte_len: artifact.len(),
            location: None,
        };
        let mut list = self
            .artifacts
            .lock()
            .map_err(|_| StoreError::Io(std::io::Error::other("memory sink poisoned")))?;
        list.push(artifact);
        Ok(descriptor)
    }
}
