//! Encrypted job arguments.
//!
//! Applications register job functions in a [`JobRegistry`] and get back a
//! [`SecureJob`] handle exposing `enqueue_now`, `enqueue_at` and
//! `schedule_recurring`. Queues only ever store the proxy entry-point and
//! three encrypted tokens; [`JobWorker`] decrypts and dispatches them.

pub mod ports;
mod proxy;
mod registry;
mod schedulers;
mod secure_job;
mod types;
mod worker;

pub use proxy::secure_job_proxy;
pub use registry::{JobFn, JobRegistry};
pub use schedulers::Schedulers;
pub use secure_job::{SecureJob, SecureJobClient};
pub use types::{
    EnqueueRequest, JobArgs, JobCall, JobHandle, JobId, JobOptions, JobStatus, QueuedJob,
    RecurringRequest, ScheduledJob,
};
pub use worker::{JobRun, JobWorker};
