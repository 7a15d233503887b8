use std::sync::Arc;
use std::time::Duration;

use securecache_common::CommonError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::key::KeyFunction;
use super::ports::CacheBackend;
use crate::config::CacheSettings;
use crate::errors::{SecureCacheError, SecureCacheResult};
use crate::serializer::SecureSerializer;

/// Typed cache client over a raw [`CacheBackend`].
///
/// Every write goes through [`SecureSerializer::dumps`] and every read
/// through [`SecureSerializer::loads`]. Secure clients refuse `incr`/`decr`
/// outright: the store cannot add to ciphertext, and a read-modify-write here
/// would not be atomic.
pub struct CacheClient {
    name: String,
    backend: Arc<dyn CacheBackend>,
    serializer: Arc<SecureSerializer>,
    keys: KeyFunction,
    default_timeout: Option<Duration>,
    secure: bool,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("name", &self.name)
            .field("keys", &self.keys)
            .field("default_timeout", &self.default_timeout)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl CacheClient {
    /// Client that stores ciphertext produced by `serializer`.
    pub fn secure(
        name: impl Into<String>,
        backend: Arc<dyn CacheBackend>,
        serializer: Arc<SecureSerializer>,
        settings: &CacheSettings,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            serializer,
            keys: KeyFunction::new(settings.key_prefix.clone(), settings.version),
            default_timeout: settings.timeout(),
            secure: true,
        }
    }

    /// Client that stores the plain serialization. Used for legacy caches.
    pub fn plain(
        name: impl Into<String>,
        backend: Arc<dyn CacheBackend>,
        settings: &CacheSettings,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            serializer: Arc::new(SecureSerializer::unencrypted()),
            keys: KeyFunction::new(settings.key_prefix.clone(), settings.version),
            default_timeout: settings.timeout(),
            secure: false,
        }
    }

    /// Pick the client flavour from the cache's serializer setting.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &CacheSettings,
        backend: Arc<dyn CacheBackend>,
        debug: bool,
    ) -> SecureCacheResult<Self> {
        let name = name.into();
        match settings.options.as_ref().filter(|_| settings.is_secure()) {
            Some(options) => {
                let serializer = SecureSerializer::from_options(options, debug)?;
                debug!(
                    cache = %name,
                    key_fingerprint = serializer.key_fingerprint().as_deref().unwrap_or("none"),
                    "secure cache client configured"
                );
                Ok(Self::secure(name, backend, Arc::new(serializer), settings))
            }
            None => Ok(Self::plain(name, backend, settings)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn key_function(&self) -> &KeyFunction {
        &self.keys
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// Store a value with the cache's default timeout.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SecureCacheResult<()> {
        self.set_with_timeout(key, value, self.default_timeout).await
    }

    /// Store a value; `None` keeps it until deleted.
    pub async fn set_with_timeout<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        timeout: Option<Duration>,
    ) -> SecureCacheResult<()> {
        let bytes = self.serializer.dumps(value)?;
        let full_key = self.keys.make_key(key);
        debug!(cache = %self.name, key = %full_key, bytes = bytes.len(), "cache set");
        self.backend.set(&full_key, bytes, timeout).await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> SecureCacheResult<Option<T>> {
        let full_key = self.keys.make_key(key);
        match self.backend.get(&full_key).await? {
            Some(bytes) => self.serializer.loads(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, key: &str) -> SecureCacheResult<bool> {
        self.backend.delete(&self.keys.make_key(key)).await
    }

    pub async fn has_key(&self, key: &str) -> SecureCacheResult<bool> {
        Ok(self.backend.get(&self.keys.make_key(key)).await?.is_some())
    }

    /// Atomic increment. Always refused on secure clients, before any I/O.
    pub async fn incr(&self, key: &str, delta: i64) -> SecureCacheResult<i64> {
        if self.secure {
            warn!(cache = %self.name, "refusing atomic increment on encrypted cache");
            return Err(SecureCacheError::unsupported("incr"));
        }
        self.backend.incr(&self.keys.make_key(key), delta).await
    }

    /// Atomic decrement. Always refused on secure clients, before any I/O.
    pub async fn decr(&self, key: &str, delta: i64) -> SecureCacheResult<i64> {
        if self.secure {
            warn!(cache = %self.name, "refusing atomic decrement on encrypted cache");
            return Err(SecureCacheError::unsupported("decr"));
        }
        let delta = delta.checked_neg().ok_or_else(|| {
            CommonError::validation("delta", format!("cannot decrement by {delta}"))
        })?;
        self.backend.incr(&self.keys.make_key(key), delta).await
    }
}
