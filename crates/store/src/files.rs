//! File storage contract and content-addressed in-memory backend.
//!
//! Binary uploads (identification documents) are stored separately from the
//! document records that reference them. Files are identified by the SHA-256
//! hash of their content:
//!
//! - identical uploads are stored once
//! - a stored file can be verified against its id
//! - ids are deterministic, so references stay stable across retries
//!
//! Absence of an upload is a valid path, not an error; callers simply skip
//! the store call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

/// Errors returned by the file storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The upload was rejected before storage (empty name or content).
    #[error("invalid file: {0}")]
    InvalidInput(String),

    /// The backend failed.
    #[error("file storage failure: {0}")]
    Unknown(String),
}

/// Reference to a stored file, kept on the owning record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Content-addressed identifier (hex SHA-256 of the bytes).
    pub id: String,
    /// Original filename from the upload.
    pub file_name: String,
    /// Size of the stored content in bytes.
    pub size_bytes: u64,
    /// URL at which the file can be viewed.
    pub url: String,
    /// UTC timestamp of the first time this content was stored.
    pub stored_at: DateTime<Utc>,
}

/// The opaque file storage service.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores `bytes` under `bucket`, returning the reference to keep on the
    /// owning record.
    async fn store_file(
        &self,
        bucket: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, FileError>;
}

/// In-memory content-addressed [`FileStore`].
pub struct MemoryFileStore {
    endpoint: String,
    inner: RwLock<HashMap<(String, String), StoredFile>>,
}

impl MemoryFileStore {
    /// Creates a store whose view URLs are rooted at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct files held across all buckets.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn view_url(&self, bucket: &str, id: &str) -> String {
        format!("{}/buckets/{}/files/{}/view", self.endpoint, bucket, id)
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn store_file(
        &self,
        bucket: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, FileError> {
        if file_name.trim().is_empty() {
            return Err(FileError::InvalidInput("file name cannot be empty".to_owned()));
        }
        if bytes.is_empty() {
            return Err(FileError::InvalidInput("file content cannot be empty".to_owned()));
        }

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let id = hex::encode(hasher.finalize());

        let mut inner = self
            .inner
            .write()
            .map_err(|_| FileError::Unknown("file store lock poisoned".to_owned()))?;

        let key = (bucket.to_owned(), id.clone());
        if let Some(existing) = inner.get(&key) {
            tracing::debug!(bucket, id, "identical content already stored");
            return Ok(existing.clone());
        }

        let stored = StoredFile {
            url: self.view_url(bucket, &id),
            id,
            file_name: file_name.to_owned(),
            size_bytes: bytes.len() as u64,
            stored_at: Utc::now(),
        };
        inner.insert(key, stored.clone());
        tracing::debug!(bucket, id = %stored.id, size = stored.size_bytes, "file stored");
        Ok(stored)
    }
}
