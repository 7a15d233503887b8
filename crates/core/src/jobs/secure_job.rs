use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use super::ports::JobQueue;
use super::proxy::seal_invocation;
use super::registry::JobRegistry;
use super::schedulers::Schedulers;
use super::types::{EnqueueRequest, JobArgs, JobCall, JobHandle, JobOptions, RecurringRequest};
use super::worker::JobWorker;
use crate::config::QueueSettings;
use crate::constants::{DEFAULT_RECURRING_TIMEOUT, SECURE_JOB_PROXY};
use crate::errors::{SecureCacheError, SecureCacheResult};
use crate::serializer::SecureSerializer;

struct Inner {
    serializer: Arc<SecureSerializer>,
    registry: Arc<JobRegistry>,
    queue: Arc<dyn JobQueue>,
    schedulers: Schedulers,
    queue_settings: QueueSettings,
}

/// Entry point for registering encrypted jobs.
///
/// Holds the injected serializer, queue and schedulers; cheap to clone.
#[derive(Clone)]
pub struct SecureJobClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SecureJobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureJobClient")
            .field("registry", &self.inner.registry)
            .field("schedulers", &self.inner.schedulers)
            .field("queue_settings", &self.inner.queue_settings)
            .finish_non_exhaustive()
    }
}

impl SecureJobClient {
    pub fn new(
        serializer: Arc<SecureSerializer>,
        registry: Arc<JobRegistry>,
        queue: Arc<dyn JobQueue>,
        schedulers: Schedulers,
        queue_settings: QueueSettings,
    ) -> Self {
        Self { inner: Arc::new(Inner { serializer, registry, queue, schedulers, queue_settings }) }
    }

    /// Register `job` under `id` and return its handle.
    pub fn register<F>(
        &self,
        id: impl Into<String>,
        options: JobOptions,
        job: F,
    ) -> SecureCacheResult<SecureJob>
    where
        F: Fn(JobArgs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let id = id.into();
        self.inner.registry.register(id.clone(), job)?;
        Ok(SecureJob { id, options, client: self.clone() })
    }

    /// Handle for a job registered elsewhere.
    pub fn job(&self, id: impl Into<String>, options: JobOptions) -> SecureCacheResult<SecureJob> {
        let id = id.into();
        if !self.inner.registry.contains(&id) {
            return Err(SecureCacheError::UnknownJobTarget(id));
        }
        Ok(SecureJob { id, options, client: self.clone() })
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.inner.registry
    }

    pub fn schedulers(&self) -> &Schedulers {
        &self.inner.schedulers
    }

    /// Worker sharing this client's registry and serializer.
    pub fn worker(&self) -> JobWorker {
        JobWorker::new(Arc::clone(&self.inner.registry), Arc::clone(&self.inner.serializer))
    }

    fn encrypted_request(
        &self,
        job_id: &str,
        options: &JobOptions,
        call: JobCall,
    ) -> SecureCacheResult<EnqueueRequest> {
        let (args, depends_on) = call.into_parts();
        let mut request = EnqueueRequest::for_target(SECURE_JOB_PROXY, options);
        request.args = seal_invocation(&self.inner.serializer, job_id, &args)?;
        request.depends_on = depends_on;
        Ok(request)
    }
}

/// Handle for one registered job.
#[derive(Debug, Clone)]
pub struct SecureJob {
    id: String,
    options: JobOptions,
    client: SecureJobClient,
}

impl SecureJob {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Queue an encrypted call for immediate execution.
    ///
    /// A dependency set with [`JobCall::depends_on`] travels as queue
    /// metadata; it is not part of the encrypted arguments.
    pub async fn enqueue_now(&self, call: JobCall) -> SecureCacheResult<JobHandle> {
        let request = self.client.encrypted_request(&self.id, &self.options, call)?;
        let handle = self.client.inner.queue.enqueue(request).await?;
        info!(job = %self.id, job_id = %handle.id, queue = %handle.queue, "enqueued encrypted job");
        Ok(handle)
    }

    /// Hand an encrypted call to the named scheduler for execution no earlier
    /// than `target_time`.
    pub async fn enqueue_at(
        &self,
        target_time: DateTime<Utc>,
        scheduler_name: &str,
        call: JobCall,
    ) -> SecureCacheResult<JobHandle> {
        let scheduler = self.client.inner.schedulers.get(scheduler_name)?;
        let request = self.client.encrypted_request(&self.id, &self.options, call)?;
        let handle = scheduler.enqueue_at(target_time, request).await?;
        info!(
            job = %self.id,
            job_id = %handle.id,
            scheduler = scheduler_name,
            target_time = %target_time,
            "scheduled encrypted job"
        );
        Ok(handle)
    }

    /// Idempotently register this job to run every `interval` on the default
    /// scheduler.
    ///
    /// Returns `None` when exactly one entry with the same interval and
    /// timeout already exists. Otherwise every entry for this job is cancelled
    /// and a single new one is created. Timeout falls back to the configured
    /// queue default, then to [`DEFAULT_RECURRING_TIMEOUT`].
    ///
    /// The list-cancel-create sequence is not atomic; call this from a single
    /// process (for example at startup) to avoid duplicate or missing entries.
    pub async fn schedule_recurring(
        &self,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> SecureCacheResult<Option<JobHandle>> {
        if interval.is_zero() {
            return Err(SecureCacheError::config("recurring interval must be positive"));
        }

        let timeout = timeout
            .or_else(|| self.client.inner.queue_settings.default_timeout())
            .unwrap_or(DEFAULT_RECURRING_TIMEOUT);
        let scheduler = self.client.inner.schedulers.default_scheduler()?;

        let existing: Vec<_> = scheduler
            .scheduled_jobs()
            .await?
            .into_iter()
            .filter(|entry| entry.target == self.id)
            .collect();

        if let [only] = existing.as_slice() {
            if only.interval == Some(interval) && only.timeout == Some(timeout) {
                info!(
                    job = %self.id,
                    interval_secs = interval.as_secs(),
                    timeout_secs = timeout.as_secs(),
                    "job already scheduled"
                );
                return Ok(None);
            }
        }

        info!(
            job = %self.id,
            interval_secs = interval.as_secs(),
            timeout_secs = timeout.as_secs(),
            replaced = existing.len(),
            "rescheduling recurring job"
        );
        for entry in &existing {
            scheduler.cancel(&entry.id).await?;
        }

        let handle = scheduler
            .schedule_recurring(RecurringRequest {
                target: self.id.clone(),
                queue: self.options.queue.clone(),
                interval,
                timeout,
                first_run: scheduler.now(),
            })
            .await?;
        Ok(Some(handle))
    }
}
