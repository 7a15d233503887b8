//! Encrypting serializer.
//!
//! [`SecureSerializer`] composes a generic [`Codec`] with AES-256-GCM sealing.
//! `dumps` encodes a value and seals the bytes under a fresh nonce; `loads`
//! authenticates the token before anything is decoded, so tampered or foreign
//! data never reaches the codec.
//!
//! ```rust
//! use securecache_core::SecureSerializer;
//!
//! let serializer = SecureSerializer::from_key("kPEDO_pSrPh3qGJVfGAflLZXKAh4AuHU64tTlP-f_PY=")?;
//! let stored = serializer.dumps("123")?;
//! assert_ne!(stored, b"\"123\"");
//! let value: String = serializer.loads(&stored)?;
//! assert_eq!(value, "123");
//! # Ok::<(), securecache_core::SecureCacheError>(())
//! ```

mod codec;

use std::sync::Arc;
use std::time::Duration;

pub use codec::{Codec, JsonCodec};
use securecache_common::{Clock, EncryptionService, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CacheOptions;
use crate::constants::MAX_CLOCK_SKEW;
use crate::errors::{SecureCacheError, SecureCacheResult};

enum Mode {
    Encrypting(EncryptionService),
    /// Debug-only fallback with no key configured.
    Plaintext,
}

/// Serializer that never hands plaintext to the cache.
///
/// Immutable after construction and `Send + Sync`; share it behind an `Arc`.
pub struct SecureSerializer<C: Codec = JsonCodec> {
    mode: Mode,
    codec: C,
    clock: Arc<dyn Clock>,
    token_ttl: Option<Duration>,
}

impl<C: Codec> std::fmt::Debug for SecureSerializer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureSerializer")
            .field("codec", &self.codec.name())
            .field("encrypting", &self.is_encrypting())
            .field("key_fingerprint", &self.key_fingerprint())
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl SecureSerializer<JsonCodec> {
    /// Encrypting JSON serializer over an existing service.
    pub fn new(service: EncryptionService) -> Self {
        Self {
            mode: Mode::Encrypting(service),
            codec: JsonCodec,
            clock: Arc::new(SystemClock),
            token_ttl: None,
        }
    }

    /// Encrypting JSON serializer from url-safe base64 key text.
    ///
    /// A malformed key fails here, not on first use.
    pub fn from_key(encoded_key: &str) -> SecureCacheResult<Self> {
        Ok(Self::new(EncryptionService::from_base64_key(encoded_key)?))
    }

    /// Build from a cache's options block.
    ///
    /// Without a key this is a configuration error unless `debug` is set, in
    /// which case values are stored unencrypted and a warning is logged.
    pub fn from_options(options: &CacheOptions, debug: bool) -> SecureCacheResult<Self> {
        let serializer = match options.secret_key() {
            Some(key) => Self::from_key(key)?,
            None if debug => Self::plaintext_for_debug(),
            None => {
                return Err(SecureCacheError::config(
                    "secret_key must be defined in secure cache options",
                ))
            }
        };

        Ok(match options.token_ttl() {
            Some(ttl) => serializer.with_token_ttl(ttl),
            None => serializer,
        })
    }

    /// Pass-through serializer for local development.
    pub fn plaintext_for_debug() -> Self {
        warn!("secure serializer running WITHOUT encryption; cache values are stored in plaintext");
        Self::unencrypted()
    }

    pub(crate) fn unencrypted() -> Self {
        Self {
            mode: Mode::Plaintext,
            codec: JsonCodec,
            clock: Arc::new(SystemClock),
            token_ttl: None,
        }
    }
}

impl<C: Codec> SecureSerializer<C> {
    /// Reject authentic tokens older than `ttl`.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = Some(ttl);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Swap the serialization step.
    pub fn with_codec<C2: Codec>(self, codec: C2) -> SecureSerializer<C2> {
        SecureSerializer { mode: self.mode, codec, clock: self.clock, token_ttl: self.token_ttl }
    }

    pub fn is_encrypting(&self) -> bool {
        matches!(self.mode, Mode::Encrypting(_))
    }

    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl
    }

    /// Fingerprint of the key, safe to log.
    pub fn key_fingerprint(&self) -> Option<String> {
        match &self.mode {
            Mode::Encrypting(service) => Some(service.key_fingerprint()),
            Mode::Plaintext => None,
        }
    }

    /// Encode `value` and seal it under a fresh nonce.
    pub fn dumps<T: Serialize + ?Sized>(&self, value: &T) -> SecureCacheResult<Vec<u8>> {
        let payload = self.codec.encode(value)?;
        match &self.mode {
            Mode::Encrypting(service) => {
                let token = service.encrypt_to_string(&payload, self.clock.secs_since_epoch())?;
                Ok(token.into_bytes())
            }
            Mode::Plaintext => Ok(payload),
        }
    }

    /// Authenticate, check age, then decode.
    pub fn loads<T: DeserializeOwned>(&self, envelope: &[u8]) -> SecureCacheResult<T> {
        match &self.mode {
            Mode::Encrypting(service) => {
                let opened = service.decrypt_from_string(envelope)?;
                self.check_age(opened.issued_at)?;
                self.codec.decode(&opened.plaintext)
            }
            Mode::Plaintext => self.codec.decode(envelope),
        }
    }

    fn check_age(&self, issued_at: u64) -> SecureCacheResult<()> {
        let Some(ttl) = self.token_ttl else {
            return Ok(());
        };

        let now = self.clock.secs_since_epoch();
        let max_age_secs = ttl.as_secs();
        let too_new = issued_at > now.saturating_add(MAX_CLOCK_SKEW.as_secs());
        let too_old = now.saturating_sub(issued_at) > max_age_secs;

        if too_new || too_old {
            debug!(issued_at, now, max_age_secs, "rejecting token outside validity window");
            return Err(SecureCacheError::Expired { issued_at, max_age_secs });
        }
        Ok(())
    }
}
