//! In-memory `BlobStore`: path-addressed byte storage with a configurable
//! URL prefix, the same resolve-a-URL-for-a-path shape the cloud store has.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use mime::Mime;
use tracing::debug;

use domains::{AppError, BlobStore, Result};

struct StoredBlob {
    data: Bytes,
    content_type: Mime,
}

pub struct MemoryBlobStore {
    url_prefix: String,
    blobs: DashMap<String, StoredBlob>,
    fail_next_upload: Mutex<Option<String>>,
}

impl MemoryBlobStore {
    pub fn new(url_prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            blobs: DashMap::new(),
            fail_next_upload: Mutex::new(None),
        }
    }

    /// Makes the next upload fail with an upload error carrying `msg`.
    pub fn fail_next_upload(&self, msg: impl Into<String>) {
        *self.fail_next_upload.lock().expect("injection lock poisoned") = Some(msg.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.contains_key(path)
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Stored payload size and content type, for assertions in tests.
    pub fn blob_meta(&self, path: &str) -> Option<(usize, Mime)> {
        self.blobs.get(path).map(|blob| (blob.data.len(), blob.content_type.clone()))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, data: Bytes, content_type: &Mime) -> Result<()> {
        if let Some(msg) = self.fail_next_upload.lock().expect("injection lock poisoned").take() {
            return Err(AppError::Upload(msg));
        }
        debug!(%path, bytes = data.len(), "blob uploaded");
        self.blobs
            .insert(path.to_string(), StoredBlob { data, content_type: content_type.clone() });
        Ok(())
    }

    async fn resolve_url(&self, path: &str) -> Result<String> {
        if !self.blobs.contains_key(path) {
            return Err(AppError::Upload(format!("no blob at {path}")));
        }
        Ok(format!("{}/{path}", self.url_prefix))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        match self.blobs.remove(path) {
            Some(_) => {
                debug!(%path, "blob deleted");
                Ok(())
            }
            None => Err(AppError::Upload(format!("no blob at {path}"))),
        }
    }
}
