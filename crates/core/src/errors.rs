//! Error types for the encryption boundary.

use securecache_common::error::{CommonError, ErrorSeverity};
use securecache_common::{impl_error_classification, impl_error_conversion, CryptoError};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type SecureCacheResult<T> = Result<T, SecureCacheError>;

/// Every failure the cache wrapper, serializer and job wrapper can surface.
#[derive(Debug, Error)]
pub enum SecureCacheError {
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Missing or malformed settings. Raised at construction, never at use.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tag mismatch, wrong key, corrupted or truncated envelope.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Authentic token outside the configured age window.
    #[error("Token issued at {issued_at} is outside the {max_age_secs}s validity window")]
    Expired { issued_at: u64, max_age_secs: u64 },

    /// Refused without touching the backend.
    #[error("Operation '{0}' is not supported on encrypted values")]
    UnsupportedOperation(String),

    #[error("No job registered under '{0}'")]
    UnknownJobTarget(String),

    #[error("Invalid job payload: {0}")]
    InvalidJobPayload(String),

    /// Error returned by a job function, passed through untouched.
    #[error(transparent)]
    Job(anyhow::Error),
}

impl SecureCacheError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation(operation.into())
    }
}

impl From<CryptoError> for SecureCacheError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKey(msg) => Self::Config(format!("invalid secret key: {msg}")),
            CryptoError::Common(common) => Self::Common(common),
            CryptoError::Encryption(msg) => {
                Self::Common(CommonError::internal(msg, "encrypt"))
            }
            rejected => Self::Decryption(rejected.to_string()),
        }
    }
}

impl_error_conversion!(SecureCacheError, Common);

impl_error_classification!(SecureCacheError, Common,
    Self::Config(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: true,
    },
    Self::Decryption(_) => {
        retryable: false,
        severity: ErrorSeverity::Critical,
        critical: true,
    },
    Self::Expired { .. } => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::UnsupportedOperation(_) | Self::UnknownJobTarget(_) | Self::InvalidJobPayload(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::Job(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
);
