use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use securecache_common::CommonError;
use securecache_core::jobs::JobStatus;
use securecache_core::{
    CacheBackend, EnqueueRequest, JobHandle, JobId, JobQueue, JobScheduler, QueuedJob,
    RecurringRequest, ScheduledJob, SecureCacheResult,
};

/// Cache backend that records every write.
#[derive(Default, Clone)]
pub struct RecordingCache {
    entries: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    writes: Arc<Mutex<Vec<(String, Vec<u8>, Option<Duration>)>>>,
    incr_calls: Arc<Mutex<usize>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw entry without going through a client.
    pub fn insert_raw(&self, key: &str, value: &[u8]) {
        self.entries.lock().unwrap().insert(key.to_string(), value.to_vec());
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn writes(&self) -> Vec<(String, Vec<u8>, Option<Duration>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn incr_calls(&self) -> usize {
        *self.incr_calls.lock().unwrap()
    }
}

#[async_trait]
impl CacheBackend for RecordingCache {
    async fn get(&self, key: &str) -> SecureCacheResult<Option<Vec<u8>>> {
        Ok(self.raw(key))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> SecureCacheResult<()> {
        self.writes.lock().unwrap().push((key.to_string(), value.clone(), ttl));
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> SecureCacheResult<bool> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> SecureCacheResult<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }

    async fn incr(&self, key: &str, delta: i64) -> SecureCacheResult<i64> {
        *self.incr_calls.lock().unwrap() += 1;
        let mut entries = self.entries.lock().unwrap();
        let current = match entries.get(key) {
            Some(raw) => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| CommonError::backend("recording", "value is not an integer", false))?,
            None => return Err(CommonError::not_found("Cache key", key).into()),
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| CommonError::backend("recording", "counter overflowed", false))?;
        entries.insert(key.to_string(), next.to_string().into_bytes());
        Ok(next)
    }
}

/// FIFO queue that keeps every request it was handed.
#[derive(Default, Clone)]
pub struct RecordingQueue {
    jobs: Arc<Mutex<Vec<QueuedJob>>>,
    statuses: Arc<Mutex<HashMap<JobId, JobStatus>>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<EnqueueRequest> {
        self.jobs.lock().unwrap().iter().map(|job| job.request.clone()).collect()
    }

    pub fn jobs(&self) -> Vec<QueuedJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, request: EnqueueRequest) -> SecureCacheResult<JobHandle> {
        let id = JobId::new();
        let handle = JobHandle {
            id: id.clone(),
            queue: request.queue.clone(),
            target: request.target.clone(),
            scheduled_for: None,
        };
        self.statuses.lock().unwrap().insert(id.clone(), JobStatus::Queued);
        self.jobs.lock().unwrap().push(QueuedJob { id, request, enqueued_at: Utc::now() });
        Ok(handle)
    }

    async fn dequeue(&self, queue: &str) -> SecureCacheResult<Option<QueuedJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let position = jobs.iter().position(|job| job.request.queue == queue);
        Ok(position.map(|idx| jobs.remove(idx)))
    }

    async fn complete(&self, id: &JobId, status: JobStatus) -> SecureCacheResult<()> {
        self.statuses.lock().unwrap().insert(id.clone(), status);
        Ok(())
    }

    async fn status(&self, id: &JobId) -> SecureCacheResult<Option<JobStatus>> {
        Ok(self.statuses.lock().unwrap().get(id).copied())
    }
}

/// Scheduler double that counts cancellations.
#[derive(Default, Clone)]
pub struct RecordingScheduler {
    entries: Arc<Mutex<Vec<ScheduledJob>>>,
    cancelled: Arc<Mutex<Vec<JobId>>>,
    frozen_at: Option<DateTime<Utc>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler whose clock always reads `at`.
    pub fn frozen_at(at: DateTime<Utc>) -> Self {
        Self { frozen_at: Some(at), ..Self::default() }
    }

    pub fn entries(&self) -> Vec<ScheduledJob> {
        self.entries.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<JobId> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Insert an entry directly, bypassing reconciliation.
    pub fn seed_recurring(&self, target: &str, interval: Duration, timeout: Duration) -> JobId {
        self.push_recurring(target, interval, timeout, self.now())
    }

    fn push_recurring(
        &self,
        target: &str,
        interval: Duration,
        timeout: Duration,
        next_run: DateTime<Utc>,
    ) -> JobId {
        let id = JobId::new();
        let request = EnqueueRequest {
            queue: "default".into(),
            target: target.into(),
            args: Vec::new(),
            kwargs: Default::default(),
            timeout: Some(timeout),
            result_ttl: Duration::from_secs(500),
            ttl: None,
            depends_on: None,
        };
        self.entries.lock().unwrap().push(ScheduledJob {
            id: id.clone(),
            target: target.into(),
            queue: "default".into(),
            next_run,
            interval: Some(interval),
            timeout: Some(timeout),
            request,
        });
        id
    }
}

#[async_trait]
impl JobScheduler for RecordingScheduler {
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
        self.entries.lock().unwrap().push(ScheduledJob {
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
        Ok(self.entries())
    }

    async fn cancel(&self, id: &JobId) -> SecureCacheResult<()> {
        self.entries.lock().unwrap().retain(|entry| &entry.id != id);
        self.cancelled.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn schedule_recurring(&self, request: RecurringRequest) -> SecureCacheResult<JobHandle> {
        let id = self.push_recurring(
            &request.target,
            request.interval,
            request.timeout,
            request.first_run,
        );
        Ok(JobHandle {
            id,
            queue: request.queue,
            target: request.target,
            scheduled_for: Some(request.first_run),
        })
    }

    fn now(&self) -> DateTime<Utc> {
        self.frozen_at.unwrap_or_else(Utc::now)
    }
}
