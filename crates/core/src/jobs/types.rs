//! Values exchanged with queues and schedulers.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::constants::{DEFAULT_QUEUE_NAME, DEFAULT_RESULT_TTL};

/// Identifier assigned to a queued or scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Fresh time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Reference to a job accepted by a queue or scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: JobId,
    pub queue: String,
    pub target: String,
    /// Set for jobs handed to a scheduler.
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Per-job queue parameters fixed at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOptions {
    pub queue: String,
    /// Execution timeout enforced by the worker runtime.
    pub timeout: Option<Duration>,
    /// How long the result is kept after completion.
    pub result_ttl: Duration,
    /// How long the job may wait in the queue before it is discarded.
    pub ttl: Option<Duration>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            queue: DEFAULT_QUEUE_NAME.to_string(),
            timeout: None,
            result_ttl: DEFAULT_RESULT_TTL,
            ttl: None,
        }
    }
}

impl JobOptions {
    pub fn on_queue(queue: impl Into<String>) -> Self {
        Self { queue: queue.into(), ..Self::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_result_ttl(mut self, result_ttl: Duration) -> Self {
        self.result_ttl = result_ttl;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Arguments for one call of a registered job.
///
/// `depends_on` is queue metadata and is never part of the encrypted
/// arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobCall {
    args: Vec<Value>,
    kwargs: Map<String, Value>,
    depends_on: Option<JobId>,
}

impl JobCall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Only run after `job` has finished successfully.
    pub fn depends_on(mut self, job: JobId) -> Self {
        self.depends_on = Some(job);
        self
    }

    pub fn dependency(&self) -> Option<&JobId> {
        self.depends_on.as_ref()
    }

    pub(crate) fn into_parts(self) -> (JobArgs, Option<JobId>) {
        (JobArgs { args: self.args, kwargs: self.kwargs }, self.depends_on)
    }
}

/// Decrypted arguments handed to a job function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobArgs {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl JobArgs {
    /// Positional argument `index` decoded as `T`.
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<T> {
        let value = self
            .args
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("missing positional argument {index}"))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Keyword argument `name` decoded as `T`, `None` when absent.
    pub fn kwarg<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        let value = self.kwargs.get(name).cloned();
        Ok(value.map(serde_json::from_value).transpose()?)
    }
}

/// What a queue stores for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub queue: String,
    /// Registry identifier, or the proxy entry-point for encrypted jobs.
    pub target: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
    pub timeout: Option<Duration>,
    pub result_ttl: Duration,
    pub ttl: Option<Duration>,
    pub depends_on: Option<JobId>,
}

impl EnqueueRequest {
    /// Request with no arguments, using `options` for queue parameters.
    pub fn for_target(target: impl Into<String>, options: &JobOptions) -> Self {
        Self {
            queue: options.queue.clone(),
            target: target.into(),
            args: Vec::new(),
            kwargs: Map::new(),
            timeout: options.timeout,
            result_ttl: options.result_ttl,
            ttl: options.ttl,
            depends_on: None,
        }
    }
}

/// A job popped from a queue, ready for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: JobId,
    pub request: EnqueueRequest,
    pub enqueued_at: DateTime<Utc>,
}

/// Lifecycle of a job inside a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for its dependency.
    Deferred,
    Queued,
    Started,
    Finished,
    Failed,
}

/// Entry held by a time-based scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: JobId,
    pub target: String,
    pub queue: String,
    pub next_run: DateTime<Utc>,
    /// Set for recurring entries.
    pub interval: Option<Duration>,
    pub timeout: Option<Duration>,
    pub request: EnqueueRequest,
}

/// Parameters of a recurring schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringRequest {
    pub target: String,
    pub queue: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub first_run: DateTime<Utc>,
}
