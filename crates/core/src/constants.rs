//! Shared constants.

use std::time::Duration;

/// Cache whose settings activate encryption when none is named explicitly.
pub const DEFAULT_CACHE_NAME: &str = "default";

/// Scheduler used for recurring registrations and the default for
/// `enqueue_at`.
pub const DEFAULT_SCHEDULER_NAME: &str = "default";

/// Queue used when a job does not name one.
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Entry-point registered with the queue for every encrypted job.
pub const SECURE_JOB_PROXY: &str = "securecache.jobs.secure_job_proxy";

/// Recurring-job timeout when neither the caller nor the queue settings
/// provide one.
pub const DEFAULT_RECURRING_TIMEOUT: Duration = Duration::from_secs(360);

/// How long job results are retained by default.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(500);

/// Default cache entry lifetime when a cache does not configure one.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(300);

/// Tokens stamped further than this in the future are rejected when a token
/// TTL is configured.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(60);
