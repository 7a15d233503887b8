//! Port interfaces for job queues and schedulers

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{
    EnqueueRequest, JobHandle, JobId, JobStatus, QueuedJob, RecurringRequest, ScheduledJob,
};
use crate::errors::SecureCacheResult;

/// Trait for job queue operations
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for immediate execution (or after its dependency)
    async fn enqueue(&self, request: EnqueueRequest) -> SecureCacheResult<JobHandle>;

    /// Pop the next runnable job from a named queue
    async fn dequeue(&self, queue: &str) -> SecureCacheResult<Option<QueuedJob>>;

    /// Record the final status of a dequeued job
    async fn complete(&self, id: &JobId, status: JobStatus) -> SecureCacheResult<()>;

    /// Current status of a job; `None` once the queue has discarded it
    async fn status(&self, id: &JobId) -> SecureCacheResult<Option<JobStatus>>;
}

/// Trait for time-based scheduler operations
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Run a job once, no earlier than `at`
    async fn enqueue_at(
        &self,
        at: DateTime<Utc>,
        request: EnqueueRequest,
    ) -> SecureCacheResult<JobHandle>;

    /// Every entry currently held by the scheduler
    async fn scheduled_jobs(&self) -> SecureCacheResult<Vec<ScheduledJob>>;

    /// Remove an entry
    async fn cancel(&self, id: &JobId) -> SecureCacheResult<()>;

    /// Create a recurring entry
    async fn schedule_recurring(&self, request: RecurringRequest) -> SecureCacheResult<JobHandle>;

    /// Current time on the scheduler's clock
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
