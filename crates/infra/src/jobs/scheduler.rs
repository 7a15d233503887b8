//! In-memory [`JobScheduler`]: one-off entries and fixed-interval entries.
//!
//! Nothing fires on its own. A host loop calls
//! [`InMemoryScheduler::enqueue_due`] to move due entries onto a queue;
//! recurring entries are re-armed one interval after the tick that fired
//! them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use securecache_common::time::{Clock, SystemClock};
use securecache_common::{CommonError, ErrorClassification};
use securecache_core::constants::DEFAULT_RESULT_TTL;
use securecache_core::{
    EnqueueRequest, JobHandle, JobId, JobQueue, JobScheduler, RecurringRequest, ScheduledJob,
    SecureCacheResult,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct InMemoryScheduler {
    entries: Mutex<Vec<ScheduledJob>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryScheduler").field("entries", &self.len()).finish_non_exhaustive()
    }
}

impl Default for InMemoryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Scheduler reading wall time from `clock` (for testing)
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::new(Vec::new()), clock }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue every entry due at `now`.
    ///
    /// One-off entries are removed once enqueued; recurring entries get
    /// `next_run = now + interval`. An entry whose enqueue fails stays in
    /// place and the error is returned.
    pub async fn enqueue_due(
        &self,
        now: DateTime<Utc>,
        queue: &dyn JobQueue,
    ) -> SecureCacheResult<Vec<JobHandle>> {
        let due: Vec<ScheduledJob> =
            self.entries.lock().iter().filter(|entry| entry.next_run <= now).cloned().collect();

        let mut handles = Vec::with_capacity(due.len());
        for entry in due {
            let handle = queue.enqueue(entry.request.clone()).await?;
            debug!(entry_id = %entry.id, job_id = %handle.id, target = %entry.target, "enqueued due entry");
            handles.push(handle);

            let mut entries = self.entries.lock();
            match entry.interval {
                Some(interval) => {
                    let step = chrono::Duration::from_std(interval).map_err(|e| {
                        CommonError::validation("interval", format!("out of range: {e}"))
                    })?;
                    if let Some(stored) = entries.iter_mut().find(|e| e.id == entry.id) {
                        stored.next_run = now + step;
                    }
                }
                None => entries.retain(|e| e.id != entry.id),
            }
        }
        Ok(handles)
    }

    /// Poll for due entries every `period` on the current runtime.
    ///
    /// Enqueue failures are logged and retried on the next tick.
    pub fn spawn_ticker(self: Arc<Self>, queue: Arc<dyn JobQueue>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if let Err(err) = self.enqueue_due(self.now(), queue.as_ref()).await {
                    warn!(error = %err, retryable = err.is_retryable(), "scheduler tick failed");
                }
            }
        })
    }
}

#[async_trait]
impl JobScheduler for InMemoryScheduler {
    async fn enqueue_at(
        &self,
        at: DateTime<Utc>,
        request: EnqueueRequest,
    ) -> SecureCacheResult<JobHandle> {
        let id = JobId::new();
        let handle = JobHandle {
            id: id.clone(),
            queue: request.queue.clone(),
            target: request.target.clone(),
            scheduled_for: Some(at),
        };
        self.entries.lock().push(ScheduledJob {
            id,
            target: request.target.clone(),
            queue: request.queue.clone(),
            next_run: at,
            interval: None,
            timeout: request.timeout,
            request,
        });
        Ok(handle)
    }

    async fn scheduled_jobs(&self) -> SecureCacheResult<Vec<ScheduledJob>> {
        Ok(self.entries.lock().clone())
    }

    async fn cancel(&self, id: &JobId) -> SecureCacheResult<()> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| &entry.id != id);
        if entries.len() == before {
            debug!(entry_id = %id, "cancel ignored; no such scheduled entry");
        }
        Ok(())
    }

    async fn schedule_recurring(&self, request: RecurringRequest) -> SecureCacheResult<JobHandle> {
        if request.interval == Duration::ZERO {
            return Err(CommonError::validation("interval", "must be positive").into());
        }

        let id = JobId::new();
        let enqueue = EnqueueRequest {
            queue: request.queue.clone(),
            target: request.target.clone(),
            args: Vec::new(),
            kwargs: serde_json::Map::new(),
            timeout: Some(request.timeout),
            result_ttl: DEFAULT_RESULT_TTL,
            ttl: None,
            depends_on: None,
        };
        info!(
            entry_id = %id,
            target = %request.target,
            interval_secs = request.interval.as_secs(),
            "recurring entry created"
        );
        self.entries.lock().push(ScheduledJob {
            id: id.clone(),
            target: request.target.clone(),
            queue: request.queue.clone(),
            next_run: request.first_run,
            interval: Some(request.interval),
            timeout: Some(request.timeout),
            request: enqueue,
        });

        Ok(JobHandle {
            id,
            queue: request.queue,
            target: request.target,
            scheduled_for: Some(request.first_run),
        })
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.system_time())
    }
}
