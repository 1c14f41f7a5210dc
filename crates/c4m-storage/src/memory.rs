//! In-memory object store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};
use crate::object_store::ObjectStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Object store kept in process memory.
#[derive(Debug)]
pub struct InMemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
    fail_deletes: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Make every subsequent delete fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("http://localhost/storage")
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::delete(key, "injected failure"));
        }
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn public_base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_delete() {
        let store = InMemoryObjectStore::new("https://cdn.test/");
        store.put("avatars/a", vec![1, 2, 3], "image/png").await.unwrap();
        assert_eq!(store.object("avatars/a").await.unwrap().content_type, "image/png");
        assert_eq!(store.public_url("avatars/a"), "https://cdn.test/avatars/a");

        store.delete("avatars/a").await.unwrap();
        store.delete("avatars/a").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_injected_delete_failure() {
        let store = InMemoryObjectStore::default();
        store.put("avatars/a", vec![1], "image/png").await.unwrap();
        store.set_fail_deletes(true);
        assert!(store.delete("avatars/a").await.is_err());
        assert_eq!(store.len().await, 1);
    }
}
