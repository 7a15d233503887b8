//! Binary layout of a sealed token.
//!
//! ```text
//! +---------+----------------+-----------+------------------------+
//! | version | issued_at (BE) | nonce     | ciphertext || GCM tag  |
//! | 1 byte  | 8 bytes        | 12 bytes  | n + 16 bytes           |
//! +---------+----------------+-----------+------------------------+
//! ```
//!
//! The version byte and timestamp form the associated data of the AEAD, so
//! neither can be altered without the tag check failing. The whole token is
//! carried as url-safe base64 text.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use super::error::{CryptoError, CryptoResult};

/// Current token format version.
pub const TOKEN_VERSION: u8 = 0xA1;
/// AES-GCM nonce length (96 bits).
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;
/// Length of the authenticated header (version + timestamp).
pub const HEADER_LEN: usize = 1 + 8;
/// Shortest possible token: header, nonce and the tag of an empty message.
pub const MIN_TOKEN_LEN: usize = HEADER_LEN + NONCE_LEN + TAG_LEN;

/// A parsed, not yet authenticated, token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedToken {
    issued_at: u64,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl SealedToken {
    pub(crate) fn new(issued_at: u64, nonce: [u8; NONCE_LEN], ciphertext: Vec<u8>) -> Self {
        Self { issued_at, nonce, ciphertext }
    }

    /// Seconds since the UNIX epoch at which the token was sealed.
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext with the trailing tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Associated data bound into the tag.
    pub fn header(&self) -> [u8; HEADER_LEN] {
        header_for(self.issued_at)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.header());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < MIN_TOKEN_LEN {
            return Err(CryptoError::Malformed(format!(
                "token is {} bytes, expected at least {}",
                bytes.len(),
                MIN_TOKEN_LEN
            )));
        }

        let version = bytes[0];
        if version != TOKEN_VERSION {
            return Err(CryptoError::UnsupportedVersion(version));
        }

        let mut ts = [0u8; 8];
        ts.copy_from_slice(&bytes[1..HEADER_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[HEADER_LEN..HEADER_LEN + NONCE_LEN]);

        Ok(Self {
            issued_at: u64::from_be_bytes(ts),
            nonce,
            ciphertext: bytes[HEADER_LEN + NONCE_LEN..].to_vec(),
        })
    }

    /// Url-safe base64 text form.
    pub fn encode(&self) -> String {
        URL_SAFE.encode(self.to_bytes())
    }

    pub fn decode(text: &[u8]) -> CryptoResult<Self> {
        let raw = URL_SAFE
            .decode(text)
            .map_err(|e| CryptoError::Malformed(format!("invalid base64: {e}")))?;
        Self::from_bytes(&raw)
    }
}

pub(crate) fn header_for(issued_at: u64) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = TOKEN_VERSION;
    header[1..].copy_from_slice(&issued_at.to_be_bytes());
    header
}
