//! The object store seam.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Minimal blob store used for public assets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Remove `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Public URL at which `key` is served.
    fn public_url(&self, key: &str) -> String;

    /// Base URL that every [`ObjectStore::public_url`] starts with.
    fn public_base_url(&self) -> &str;
}
