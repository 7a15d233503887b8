//! Settings recognised by the encryption layer.
//!
//! Loading from the environment or files lives in `securecache-infra`; this
//! module only defines the shape and the fail-fast validation rules.

use std::collections::BTreeMap;
use std::time::Duration;

use securecache_common::EncryptionService;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{DEFAULT_CACHE_NAME, DEFAULT_CACHE_TIMEOUT};
use crate::errors::{SecureCacheError, SecureCacheResult};

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureCacheSettings {
    /// Cache whose options activate encryption. Missing means `"default"`;
    /// `null` or an empty string turns the secure layer off.
    #[serde(default = "default_secure_cache_name")]
    pub secure_cache_name: Option<String>,

    /// Permits the plaintext fallback when no key is configured.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub queues: QueueSettings,

    #[serde(default)]
    pub caches: BTreeMap<String, CacheSettings>,
}

fn default_secure_cache_name() -> Option<String> {
    Some(DEFAULT_CACHE_NAME.to_string())
}

impl Default for SecureCacheSettings {
    fn default() -> Self {
        Self {
            secure_cache_name: default_secure_cache_name(),
            debug: false,
            queues: QueueSettings::default(),
            caches: BTreeMap::new(),
        }
    }
}

/// Queue-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    pub default_timeout_secs: Option<u64>,
}

impl QueueSettings {
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_secs.map(Duration::from_secs)
    }
}

/// One named cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub key_prefix: String,

    #[serde(default = "default_key_version")]
    pub version: u32,

    /// Entry lifetime in seconds; `None` keeps entries until deleted.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub options: Option<CacheOptions>,
}

fn default_key_version() -> u32 {
    1
}

fn default_timeout_secs() -> Option<u64> {
    Some(DEFAULT_CACHE_TIMEOUT.as_secs())
}

impl CacheSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// True when values in this cache go through the encrypting serializer.
    pub fn is_secure(&self) -> bool {
        self.options.as_ref().is_some_and(|opts| opts.serializer == SerializerKind::Secure)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            version: default_key_version(),
            timeout_secs: default_timeout_secs(),
            options: None,
        }
    }
}

/// Serializer selection for a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializerKind {
    #[default]
    Secure,
    Plain,
}

/// Options block of a cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheOptions {
    #[serde(default)]
    pub serializer: SerializerKind,

    /// Url-safe base64 of a 32-byte key.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Maximum token age in seconds. Unset means tokens never expire.
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,

    #[serde(default)]
    pub data_recovery: Option<DataRecoverySettings>,
}

impl CacheOptions {
    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl_secs.map(Duration::from_secs)
    }

    /// Configured key, ignoring blank values.
    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }
}

/// Descriptor for the one-shot copy of legacy plaintext entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecoverySettings {
    pub old_key_prefix: String,
    pub old_cache_name: String,
    #[serde(default)]
    pub clear_old_entries: bool,
}

impl SecureCacheSettings {
    /// Name of the cache that activates encryption, if the layer is on.
    pub fn selected_cache_name(&self) -> Option<&str> {
        self.secure_cache_name.as_deref().filter(|name| !name.is_empty())
    }

    /// The selected cache and its settings.
    pub fn secure_cache(&self) -> SecureCacheResult<Option<(&str, &CacheSettings)>> {
        let Some(name) = self.selected_cache_name() else {
            return Ok(None);
        };
        let cache = self.caches.get(name).ok_or_else(|| {
            SecureCacheError::config(format!("secure cache '{name}' is not defined in caches"))
        })?;
        Ok(Some((name, cache)))
    }

    /// Options of the selected cache when it uses the secure serializer.
    pub fn secure_cache_options(&self) -> SecureCacheResult<Option<&CacheOptions>> {
        let Some((name, cache)) = self.secure_cache()? else {
            return Ok(None);
        };
        let options = cache.options.as_ref().ok_or_else(|| {
            SecureCacheError::config(format!("options must be defined for secure cache '{name}'"))
        })?;
        Ok((options.serializer == SerializerKind::Secure).then_some(options))
    }

    /// Fail-fast validation of everything the secure layer depends on.
    pub fn validate(&self) -> SecureCacheResult<()> {
        if self.queues.default_timeout_secs == Some(0) {
            return Err(SecureCacheError::config("queues.default_timeout_secs must be positive"));
        }

        let Some(options) = self.secure_cache_options()? else {
            return Ok(());
        };

        match options.secret_key() {
            Some(key) => {
                EncryptionService::from_base64_key(key)?;
            }
            None if self.debug => {
                warn!("no secret key configured; debug mode will store cache values unencrypted");
            }
            None => {
                return Err(SecureCacheError::config(
                    "secret_key must be defined in secure cache options",
                ));
            }
        }

        if options.token_ttl_secs == Some(0) {
            return Err(SecureCacheError::config("token_ttl_secs must be positive"));
        }

        if let Some(recovery) = &options.data_recovery {
            if !self.caches.contains_key(&recovery.old_cache_name) {
                return Err(SecureCacheError::config(format!(
                    "data recovery source cache '{}' is not defined",
                    recovery.old_cache_name
                )));
            }
            if recovery.old_key_prefix.is_empty() {
                return Err(SecureCacheError::config("data_recovery.old_key_prefix is empty"));
            }
        }

        Ok(())
    }
}
