//! AES-256-GCM encryption service.
//!
//! - [`EncryptionService`]: seals plaintext into a [`SealedToken`] and opens it
//!   again, authenticating the token header along with the payload
//! - Key generation, url-safe base64 key parsing and key fingerprints
//!
//! ## Usage
//!
//! ```rust
//! use securecache_common::crypto::EncryptionService;
//!
//! let key = EncryptionService::generate_key();
//! let service = EncryptionService::new(key)?;
//!
//! let token = service.encrypt_to_string(b"sensitive data", 1_700_000_000)?;
//! let opened = service.decrypt_from_string(token.as_bytes())?;
//! assert_eq!(opened.plaintext, b"sensitive data");
//! assert_eq!(opened.issued_at, 1_700_000_000);
//! # Ok::<(), securecache_common::crypto::CryptoError>(())
//! ```

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use sha2::{Digest, Sha256};

use super::error::{CryptoError, CryptoResult};
use super::token::{header_for, SealedToken, NONCE_LEN};

/// Required key length in bytes.
pub const KEY_LEN: usize = 32;

/// Plaintext recovered from an authenticated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedToken {
    pub issued_at: u64,
    pub plaintext: Vec<u8>,
}

/// AES-GCM encryption service bound to one symmetric key.
#[derive(Clone)]
pub struct EncryptionService {
    key: Vec<u8>,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("key", &"[REDACTED]")
            .field("fingerprint", &self.key_fingerprint())
            .finish()
    }
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key.
    pub fn new(key: Vec<u8>) -> CryptoResult<Self> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "key must be exactly {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::InvalidKey(format!("failed to create cipher: {e}")))?;

        let service = Self { key, cipher };
        tracing::debug!(key_fingerprint = %service.key_fingerprint(), "encryption key loaded");
        Ok(service)
    }

    /// Create a service from url-safe base64 key text.
    ///
    /// Surrounding whitespace is ignored; the decoded key must be 32 bytes.
    pub fn from_base64_key(encoded: &str) -> CryptoResult<Self> {
        let key = URL_SAFE
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("key is not url-safe base64: {e}")))?;
        Self::new(key)
    }

    /// Generate a random 32-byte symmetric key.
    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Generate a random key in the url-safe base64 form accepted by
    /// [`EncryptionService::from_base64_key`].
    pub fn generate_encoded_key() -> String {
        URL_SAFE.encode(Self::generate_key())
    }

    /// Seal bytes with a fresh nonce, stamping the token with `issued_at`.
    pub fn seal(&self, data: &[u8], issued_at: u64) -> CryptoResult<SealedToken> {
        let nonce_bytes = Self::generate_nonce();
        let header = header_for(issued_at);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), Payload { msg: data, aad: &header })
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        Ok(SealedToken::new(issued_at, nonce_bytes, ciphertext))
    }

    /// Authenticate and decrypt a token.
    ///
    /// Any tampering with the header, nonce, ciphertext or tag, and any token
    /// sealed under a different key, yields [`CryptoError::Integrity`].
    pub fn open(&self, token: &SealedToken) -> CryptoResult<Vec<u8>> {
        let header = token.header();
        self.cipher
            .decrypt(
                Nonce::from_slice(token.nonce()),
                Payload { msg: token.ciphertext(), aad: &header },
            )
            .map_err(|_| CryptoError::Integrity)
    }

    /// Seal bytes and return the url-safe base64 token text.
    pub fn encrypt_to_string(&self, data: &[u8], issued_at: u64) -> CryptoResult<String> {
        Ok(self.seal(data, issued_at)?.encode())
    }

    /// Parse token text, then authenticate and decrypt it.
    pub fn decrypt_from_string(&self, token: &[u8]) -> CryptoResult<OpenedToken> {
        let sealed = SealedToken::decode(token)?;
        let plaintext = self.open(&sealed)?;
        Ok(OpenedToken { issued_at: sealed.issued_at(), plaintext })
    }

    /// Generate a short fingerprint for the current key.
    pub fn key_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        let result = hasher.finalize();
        URL_SAFE.encode(&result[..8])
    }

    fn generate_nonce() -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }
}
