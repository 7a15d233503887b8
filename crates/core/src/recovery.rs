//! One-shot copy of legacy plaintext entries into the encrypted cache.
//!
//! Lists every key under the old prefix, skips anything already under the
//! new cache's prefix, re-writes each value through the secure client and
//! optionally deletes the original.

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::CacheClient;
use crate::config::{DataRecoverySettings, SecureCacheSettings};
use crate::errors::{SecureCacheError, SecureCacheResult};

/// Counters from a recovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Keys found under the old prefix.
    pub scanned: usize,
    pub copied: usize,
    /// Keys already under the new prefix, unparseable, or gone before read.
    pub skipped: usize,
    pub deleted: usize,
}

/// Copies entries from a plain cache into a secure one.
#[derive(Debug, Clone)]
pub struct DataRecoveryService {
    settings: DataRecoverySettings,
}

impl DataRecoveryService {
    pub fn new(settings: DataRecoverySettings) -> Self {
        Self { settings }
    }

    /// Recovery descriptor of the selected secure cache, if any.
    pub fn from_settings(settings: &SecureCacheSettings) -> SecureCacheResult<Option<Self>> {
        Ok(settings
            .secure_cache_options()?
            .and_then(|options| options.data_recovery.clone())
            .map(Self::new))
    }

    pub fn settings(&self) -> &DataRecoverySettings {
        &self.settings
    }

    /// Copy every legacy entry from `old` into `new`.
    pub async fn run(
        &self,
        old: &CacheClient,
        new: &CacheClient,
    ) -> SecureCacheResult<RecoveryReport> {
        if !new.is_secure() {
            return Err(SecureCacheError::config(format!(
                "recovery target cache '{}' is not encrypted",
                new.name()
            )));
        }

        let new_prefix = new.key_function().prefix();
        let full_keys = old.backend().keys(&self.settings.old_key_prefix).await?;
        let mut report = RecoveryReport { scanned: full_keys.len(), ..RecoveryReport::default() };

        for full_key in &full_keys {
            if !new_prefix.is_empty() && full_key.contains(new_prefix) {
                report.skipped += 1;
                continue;
            }
            let Some(key) = old.key_function().reverse_key(full_key) else {
                debug!(key = %full_key, "skipping key without prefix and version");
                report.skipped += 1;
                continue;
            };
            let Some(value) = old.get::<Value>(key).await? else {
                report.skipped += 1;
                continue;
            };

            new.set(key, &value).await?;
            report.copied += 1;

            if self.settings.clear_old_entries && old.delete(key).await? {
                report.deleted += 1;
            }
        }

        info!(
            from = old.name(),
            to = new.name(),
            scanned = report.scanned,
            copied = report.copied,
            skipped = report.skipped,
            deleted = report.deleted,
            "data recovery finished"
        );
        Ok(report)
    }
}
