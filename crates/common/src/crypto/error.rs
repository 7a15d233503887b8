use thiserror::Error;

use crate::error::{CommonError, ErrorSeverity};
use crate::{impl_error_classification, impl_error_conversion};

/// Result alias for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised while sealing or opening tokens.
///
/// `Malformed`, `UnsupportedVersion` and `Integrity` all mean the token cannot
/// be trusted; callers normally collapse them into a single "decryption
/// failed" outcome and must not leak which check rejected the input.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unsupported token version: {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("Token failed authentication")]
    Integrity,

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

impl CryptoError {
    /// True for every failure that means "this token is not trustworthy".
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::UnsupportedVersion(_) | Self::Integrity)
    }
}

impl_error_conversion!(CryptoError, Common);

impl_error_classification!(CryptoError, Common,
    Self::InvalidKey(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::Malformed(_) | Self::UnsupportedVersion(_) => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::Integrity => {
        retryable: false,
        severity: ErrorSeverity::Critical,
        critical: true,
    },
    Self::Encryption(_) => {
        retryable: false,
        severity: ErrorSeverity::Critical,
        critical: true,
    },
);
