//! Wires settings, in-memory adapters and the core services together.

use std::sync::Arc;

use securecache_core::{
    CacheBackend, CacheClient, DataRecoveryService, JobRegistry, RecoveryReport, Schedulers,
    SecureCacheError, SecureCacheResult, SecureCacheSettings, SecureJobClient, SecureSerializer,
};

use crate::cache::MemoryCacheBackend;
use crate::jobs::{InMemoryJobQueue, InMemoryScheduler};

/// Everything an application needs from the encryption layer.
#[derive(Debug)]
pub struct SecureCacheStack {
    pub cache: CacheClient,
    pub jobs: SecureJobClient,
    pub backend: Arc<MemoryCacheBackend>,
    pub queue: Arc<InMemoryJobQueue>,
    pub scheduler: Arc<InMemoryScheduler>,
    recovery: Option<(DataRecoveryService, CacheClient)>,
}

impl SecureCacheStack {
    /// Build the stack over fresh in-memory adapters.
    ///
    /// # Errors
    /// Returns `SecureCacheError::Config` if settings fail validation or the
    /// secure layer is switched off.
    pub fn in_memory(settings: &SecureCacheSettings) -> SecureCacheResult<Self> {
        settings.validate()?;
        let (name, cache_settings) = settings
            .secure_cache()?
            .ok_or_else(|| SecureCacheError::config("secure cache layer is disabled"))?;
        let options = settings.secure_cache_options()?.ok_or_else(|| {
            SecureCacheError::config(format!("cache '{name}' does not use the secure serializer"))
        })?;

        let serializer = Arc::new(SecureSerializer::from_options(options, settings.debug)?);
        let backend = Arc::new(MemoryCacheBackend::default());
        let shared: Arc<dyn CacheBackend> = backend.clone();
        let cache =
            CacheClient::secure(name, Arc::clone(&shared), Arc::clone(&serializer), cache_settings);

        let queue = Arc::new(InMemoryJobQueue::new());
        let scheduler = Arc::new(InMemoryScheduler::new());
        let jobs = SecureJobClient::new(
            serializer,
            Arc::new(JobRegistry::new()),
            queue.clone(),
            Schedulers::single(scheduler.clone()),
            settings.queues.clone(),
        );

        let recovery = match DataRecoveryService::from_settings(settings)? {
            Some(service) => {
                let old_name = service.settings().old_cache_name.clone();
                let old_settings = settings.caches.get(&old_name).ok_or_else(|| {
                    SecureCacheError::config(format!("cache '{old_name}' is not defined"))
                })?;
                let old = CacheClient::from_settings(
                    old_name,
                    old_settings,
                    Arc::clone(&shared),
                    settings.debug,
                )?;
                Some((service, old))
            }
            None => None,
        };

        tracing::info!(
            cache = name,
            encrypting = cache.is_secure(),
            recovery = recovery.is_some(),
            "secure cache stack ready"
        );
        Ok(Self { cache, jobs, backend, queue, scheduler, recovery })
    }

    /// Run the configured one-shot recovery, if any.
    pub async fn recover_legacy_entries(&self) -> SecureCacheResult<Option<RecoveryReport>> {
        match &self.recovery {
            Some((service, old)) => Ok(Some(service.run(old, &self.cache).await?)),
            None => Ok(None),
        }
    }

    /// Legacy cache client used by recovery.
    pub fn legacy_cache(&self) -> Option<&CacheClient> {
        self.recovery.as_ref().map(|(_, old)| old)
    }
}
