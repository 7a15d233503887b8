//! In-process cache backend with moka
//!
//! Stores raw bytes exactly as handed over by the cache client, so under a
//! secure client only ciphertext ever lands here. Each entry carries its own
//! time-to-live via a moka [`Expiry`] policy.
//!
//! Every write goes through moka's per-key compute lock, so a counter update
//! never interleaves with a `set` or `delete` on the same key.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use moka::Expiry;
use securecache_common::CommonError;
use securecache_core::{CacheBackend, SecureCacheResult};

/// Default max capacity (10 000 entries)
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    pub max_capacity: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self { max_capacity: DEFAULT_MAX_CAPACITY }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    bytes: Arc<[u8]>,
    ttl: Option<Duration>,
}

struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

impl Entry {
    fn counter(&self, key: &str) -> SecureCacheResult<i64> {
        std::str::from_utf8(&self.bytes)
            .ok()
            .and_then(|text| text.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                CommonError::backend(SERVICE, format!("value of '{key}' is not an integer"), false)
                    .into()
            })
    }
}

const SERVICE: &str = "memory-cache";

/// Byte store backed by a `moka::sync::Cache`.
pub struct MemoryCacheBackend {
    entries: Cache<String, Entry>,
    writes: AtomicU64,
}

impl std::fmt::Debug for MemoryCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheBackend")
            .field("entries", &self.entries.entry_count())
            .field("writes", &self.write_count())
            .finish()
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new(MemoryCacheConfig::default())
    }
}

impl MemoryCacheBackend {
    pub fn new(config: MemoryCacheConfig) -> Self {
        tracing::info!(max_capacity = config.max_capacity, "memory cache backend configured");
        let entries = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .build();
        Self { entries, writes: AtomicU64::new(0) }
    }

    /// Number of successful writes, including counter updates.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Raw bytes stored under a fully qualified key.
    pub fn raw(&self, full_key: &str) -> Option<Vec<u8>> {
        self.entries.get(full_key).map(|entry| entry.bytes.to_vec())
    }

    fn store(&self, key: &str, bytes: Vec<u8>, ttl: Option<Duration>) {
        let entry = Entry { bytes: bytes.into(), ttl };
        self.entries.entry(key.to_string()).and_compute_with(|_| Op::Put(entry));
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> SecureCacheResult<Option<Vec<u8>>> {
        Ok(self.raw(key))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> SecureCacheResult<()> {
        self.store(key, value, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> SecureCacheResult<bool> {
        let result = self
            .entries
            .entry(key.to_string())
            .and_compute_with(|current| if current.is_some() { Op::Remove } else { Op::Nop });
        Ok(matches!(result, CompResult::Removed(_)))
    }

    async fn keys(&self, prefix: &str) -> SecureCacheResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn incr(&self, key: &str, delta: i64) -> SecureCacheResult<i64> {
        let mut outcome: SecureCacheResult<i64> =
            Err(CommonError::not_found("Cache key", key).into());
        self.entries.entry(key.to_string()).and_compute_with(|current| {
            let Some(current) = current else {
                return Op::Nop;
            };
            let entry = current.value();
            let next = entry.counter(key).and_then(|value| {
                value.checked_add(delta).ok_or_else(|| {
                    CommonError::backend(SERVICE, format!("counter '{key}' overflowed"), false).into()
                })
            });
            match next {
                Ok(next) => {
                    outcome = Ok(next);
                    Op::Put(Entry { bytes: next.to_string().into_bytes().into(), ttl: entry.ttl })
                }
                Err(err) => {
                    outcome = Err(err);
                    Op::Nop
                }
            }
        });

        if outcome.is_ok() {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }
}
