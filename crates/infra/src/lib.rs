//! # SecureCache Infrastructure
//!
//! Adapters for the ports defined in `securecache-core`.
//!
//! This crate contains:
//! - Configuration loading from the environment or JSON/TOML files
//! - An in-memory cache backend (moka) with per-entry expiry
//! - An in-memory job queue with dependency gating and a scheduler
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `securecache-core`
//! - Contains all I/O and process-level setup

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod jobs;
pub mod logging;

pub use bootstrap::SecureCacheStack;
pub use cache::{MemoryCacheBackend, MemoryCacheConfig};
pub use jobs::{InMemoryJobQueue, InMemoryScheduler};
pub use logging::init_tracing;
