//! Shared cryptographic primitives: AES-256-GCM sealing and the token format.

pub mod encryption;
pub mod error;
pub mod token;

pub use encryption::{EncryptionService, OpenedToken};
pub use error::{CryptoError, CryptoResult};
pub use token::SealedToken;
