//! Storage backends for the transaction collection
//!
//! A backend holds exactly one textual document under a well-known location.
//! The file backend is the production medium; the memory backend doubles as
//! the test fake and the in-session degradation target when the filesystem
//! is unavailable.

use crate::error::{TrackerError, TrackerResult};

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Raw persistence medium for the serialized record collection
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the stored document, `None` if nothing was ever written
    async fn read(&self) -> TrackerResult<Option<String>>;

    /// Atomically replace the stored document
    async fn write(&self, payload: &str) -> TrackerResult<()>;
}

/// JSON document on the local filesystem
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self) -> TrackerResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrackerError::Storage(e.to_string())),
        }
    }

    async fn write(&self, payload: &str) -> TrackerResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TrackerError::Storage(e.to_string()))?;
        }

        // Write-then-rename: a crash mid-write may lose this save but can
        // never truncate the previous collection.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, payload)
            .await
            .map_err(|e| TrackerError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| TrackerError::Storage(e.to_string()))
    }
}

/// In-memory backend
#[derive(Default)]
pub struct MemoryBackend {
    cell: RwLock<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self) -> TrackerResult<Option<String>> {
        Ok(self.cell.read().await.clone())
    }

    async fn write(&self, payload: &str) -> TrackerResult<()> {
        *self.cell.write().await = Some(payload.to_string());
        Ok(())
    }
}
