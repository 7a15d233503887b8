//! Cache backends implementing [`securecache_core::CacheBackend`].

pub mod memory;

pub use memory::{MemoryCacheBackend, MemoryCacheConfig};
