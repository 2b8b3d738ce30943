//! Raw byte storage behind upload/evidence generation.
//!
//! The platform only ever addresses blobs by storage key; the filesystem
//! (or object store) behind a production implementation is an external
//! concern.

use async_trait::async_trait;
use oddly_core::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_blob(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    async fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Returns whether a blob was actually removed.
    async fn delete_blob(&self, key: &str) -> Result<bool>;

    async fn blob_exists(&self, key: &str) -> Result<bool>;
}

/// In-memory blob store used embedded and in tests.
#[derive(Default)]
pub struct MemBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs; used by dedup tests.
    pub fn blob_count(&self) -> usize {
        self.blobs.read().len()
    }
}

#[async_trait]
impl BlobStore for MemBlobStore {
    async fn put_blob(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.blobs.write().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(key).cloned())
    }

    async fn delete_blob(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.write().remove(key).is_some())
    }

    async fn blob_exists(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemBlobStore::new();
        store.put_blob("a/b", b"payload".to_vec()).await.unwrap();

        assert_eq!(store.get_blob("a/b").await.unwrap().unwrap(), b"payload");
        assert!(store.blob_exists("a/b").await.unwrap());
        assert!(store.delete_blob("a/b").await.unwrap());
        assert!(!store.delete_blob("a/b").await.unwrap());
        assert_eq!(store.blob_count(), 0);
    }
}
