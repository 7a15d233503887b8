//! In-memory [`JobQueue`] with named queues and dependency gating.
//!
//! A job whose dependency has not finished is held as
//! [`JobStatus::Deferred`] and moved onto its queue once the dependency
//! completes with [`JobStatus::Finished`].
//!
//! A job with a `ttl` that has waited longer than that is discarded instead
//! of being handed out. Finished and failed jobs are forgotten once their
//! `result_ttl` has passed.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use securecache_common::time::{Clock, SystemClock};
use securecache_common::CommonError;
use securecache_core::jobs::JobStatus;
use securecache_core::{
    EnqueueRequest, JobHandle, JobId, JobQueue, QueuedJob, SecureCacheResult,
};
use tracing::debug;

const SERVICE: &str = "memory-queue";

/// `start + span`, or `None` when it does not fit.
fn deadline(start: DateTime<Utc>, span: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(span).ok().and_then(|span| start.checked_add_signed(span))
}

#[derive(Debug, Default)]
struct QueueState {
    ready: HashMap<String, VecDeque<JobId>>,
    jobs: HashMap<JobId, QueuedJob>,
    statuses: HashMap<JobId, JobStatus>,
    deferred: Vec<JobId>,
    ended_at: HashMap<JobId, DateTime<Utc>>,
}

impl QueueState {
    fn push_ready(&mut self, id: JobId, queue: &str) {
        self.ready.entry(queue.to_string()).or_default().push_back(id.clone());
        self.statuses.insert(id, JobStatus::Queued);
    }

    fn release_dependents(&mut self, finished: &JobId) {
        let (released, waiting): (Vec<JobId>, Vec<JobId>) =
            std::mem::take(&mut self.deferred).into_iter().partition(|id| {
                self.jobs.get(id).and_then(|job| job.request.depends_on.as_ref()) == Some(finished)
            });
        self.deferred = waiting;

        for id in released {
            let Some(queue) = self.jobs.get(&id).map(|job| job.request.queue.clone()) else {
                continue;
            };
            debug!(job_id = %id, dependency = %finished, "releasing deferred job");
            self.push_ready(id, &queue);
        }
    }

    fn waited_too_long(&self, id: &JobId, now: DateTime<Utc>) -> bool {
        self.jobs.get(id).is_some_and(|job| {
            job.request
                .ttl
                .and_then(|ttl| deadline(job.enqueued_at, ttl))
                .is_some_and(|deadline| deadline <= now)
        })
    }

    fn forget(&mut self, id: &JobId) {
        self.jobs.remove(id);
        self.statuses.remove(id);
        self.ended_at.remove(id);
    }

    /// Drop deferred jobs past their `ttl` and ended jobs past their
    /// `result_ttl`. Ready jobs are checked when dequeued.
    fn purge(&mut self, now: DateTime<Utc>) {
        let (expired, waiting): (Vec<JobId>, Vec<JobId>) = std::mem::take(&mut self.deferred)
            .into_iter()
            .partition(|id| self.waited_too_long(id, now));
        self.deferred = waiting;
        for id in expired {
            debug!(job_id = %id, "discarding deferred job past its ttl");
            self.forget(&id);
        }

        let stale: Vec<JobId> = self
            .ended_at
            .iter()
            .filter(|(id, ended)| {
                self.jobs
                    .get(*id)
                    .and_then(|job| deadline(**ended, job.request.result_ttl))
                    .map_or(true, |keep_until| keep_until <= now)
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            debug!(job_id = %id, "dropping job result past its result_ttl");
            self.forget(&id);
        }
    }
}

/// FIFO queues keyed by name, held in process memory.
pub struct InMemoryJobQueue {
    state: Mutex<QueueState>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryJobQueue")
            .field("jobs", &self.state.lock().jobs.len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Queue reading wall time from `clock` (for testing)
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { state: Mutex::new(QueueState::default()), clock }
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.system_time())
    }

    /// Jobs ready to run on `queue`.
    pub fn len(&self, queue: &str) -> usize {
        self.state.lock().ready.get(queue).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }

    /// Stored request of a job the queue still remembers.
    pub fn request(&self, id: &JobId) -> Option<EnqueueRequest> {
        self.state.lock().jobs.get(id).map(|job| job.request.clone())
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, request: EnqueueRequest) -> SecureCacheResult<JobHandle> {
        let id = JobId::new();
        let handle = JobHandle {
            id: id.clone(),
            queue: request.queue.clone(),
            target: request.target.clone(),
            scheduled_for: None,
        };

        let now = self.now();
        let mut state = self.state.lock();
        state.purge(now);
        let blocked = request.depends_on.as_ref().is_some_and(|parent| {
            state.statuses.get(parent) != Some(&JobStatus::Finished)
        });
        let queue = request.queue.clone();
        state.jobs.insert(id.clone(), QueuedJob { id: id.clone(), request, enqueued_at: now });

        if blocked {
            state.statuses.insert(id.clone(), JobStatus::Deferred);
            state.deferred.push(id);
        } else {
            state.push_ready(id, &queue);
        }
        Ok(handle)
    }

    async fn dequeue(&self, queue: &str) -> SecureCacheResult<Option<QueuedJob>> {
        let now = self.now();
        let mut state = self.state.lock();
        state.purge(now);
        loop {
            let Some(id) = state.ready.get_mut(queue).and_then(VecDeque::pop_front) else {
                return Ok(None);
            };
            if state.waited_too_long(&id, now) {
                debug!(job_id = %id, queue, "discarding queued job past its ttl");
                state.forget(&id);
                continue;
            }
            let job = state.jobs.get(&id).cloned().ok_or_else(|| {
                CommonError::backend(SERVICE, format!("job {id} vanished from queue"), false)
            })?;
            state.statuses.insert(id, JobStatus::Started);
            return Ok(Some(job));
        }
    }

    async fn complete(&self, id: &JobId, status: JobStatus) -> SecureCacheResult<()> {
        let now = self.now();
        let mut state = self.state.lock();
        state.purge(now);
        if !state.jobs.contains_key(id) {
            return Err(CommonError::not_found("Job", id.as_str()).into());
        }
        state.statuses.insert(id.clone(), status);
        match status {
            JobStatus::Finished => {
                state.ended_at.insert(id.clone(), now);
                state.release_dependents(id);
            }
            JobStatus::Failed => {
                state.ended_at.insert(id.clone(), now);
            }
            _ => {}
        }
        Ok(())
    }

    async fn status(&self, id: &JobId) -> SecureCacheResult<Option<JobStatus>> {
        let now = self.now();
        let mut state = self.state.lock();
        state.purge(now);
        Ok(state.statuses.get(id).copied())
    }
}
