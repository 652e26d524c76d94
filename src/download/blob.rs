//! Locally addressable in-memory blobs

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// MIME type
    pub mime: String,
    /// Content
    pub data: Bytes,
}

/// Address of a registered blob (`blob:qrgen/<uuid>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobUrl(Uuid);

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:qrgen/{}", self.0)
    }
}

/// Registry of blobs that stay resolvable until revoked.
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    entries: Arc<Mutex<HashMap<Uuid, Blob>>>,
}

impl BlobRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` and return its address.
    pub fn create(&self, data: Bytes, mime: &str) -> BlobUrl {
        let id = Uuid::new_v4();
        let blob = Blob {
            mime: mime.to_string(),
            data,
        };
        self.entries
            .lock()
            .expect("blob registry mutex poisoned")
            .insert(id, blob);
        BlobUrl(id)
    }

    /// Look up a live blob.
    pub fn resolve(&self, url: &BlobUrl) -> Option<Blob> {
        self.entries
            .lock()
            .expect("blob registry mutex poisoned")
            .get(&url.0)
            .cloned()
    }

    /// Release a blob. Returns false if it was already gone.
    pub fn revoke(&self, url: &BlobUrl) -> bool {
        self.entries
            .lock()
            .expect("blob registry mutex poisoned")
            .remove(&url.0)
            .is_some()
    }

    /// Release a blob after `delay` on a background task.
    pub fn revoke_after(&self, url: BlobUrl, delay: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if registry.revoke(&url) {
                tracing::trace!(%url, "Revoked blob");
            }
        })
    }

    /// Number of live blobs.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("blob registry mutex poisoned")
            .len()
    }

    /// True when no blob is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
