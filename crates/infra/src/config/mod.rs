//! Configuration loading
//!
//! Loads [`SecureCacheSettings`](securecache_core::SecureCacheSettings) from
//! environment variables or files and validates it before returning.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, search_config_paths};
