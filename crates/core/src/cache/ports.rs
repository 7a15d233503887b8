//! Port interfaces for key-value cache backends

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::SecureCacheResult;

/// Raw byte store underneath [`crate::CacheClient`].
///
/// Keys passed here are already fully qualified (prefix and version
/// applied). Implementations surface their own failures as
/// `CommonError::Backend` or `CommonError::NotFound`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the stored bytes for a key
    async fn get(&self, key: &str) -> SecureCacheResult<Option<Vec<u8>>>;

    /// Store bytes; `ttl` of `None` keeps the entry until deleted
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> SecureCacheResult<()>;

    /// Remove a key, returning whether it existed
    async fn delete(&self, key: &str) -> SecureCacheResult<bool>;

    /// List full keys starting with `prefix`
    async fn keys(&self, prefix: &str) -> SecureCacheResult<Vec<String>>;

    /// Atomically add `delta` to an integer value
    async fn incr(&self, key: &str, delta: i64) -> SecureCacheResult<i64>;
}
