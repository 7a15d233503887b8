//! # SecureCache Core
//!
//! Encryption boundary between an application and its key-value cache and
//! job queue - no infrastructure dependencies.
//!
//! This crate contains:
//! - The encrypting serializer (`dumps`/`loads`)
//! - The cache client wrapper that refuses atomic increments on ciphertext
//! - Encrypted job arguments: registry, handles, proxy entry-point and worker
//! - The one-shot data recovery service for legacy plaintext entries
//! - Port interfaces (traits) for caches, queues and schedulers
//!
//! ## Architecture Principles
//! - Only depends on `securecache-common`
//! - No network, storage or platform code
//! - All external collaborators via traits
//! - Serializer is constructed once and injected, never global

pub mod cache;
pub mod config;
pub mod constants;
pub mod errors;
pub mod jobs;
pub mod recovery;
pub mod serializer;

pub use cache::ports::CacheBackend;
pub use cache::{CacheClient, KeyFunction};
pub use config::{
    CacheOptions, CacheSettings, DataRecoverySettings, QueueSettings, SecureCacheSettings,
    SerializerKind,
};
pub use errors::{SecureCacheError, SecureCacheResult};
pub use jobs::ports::{JobQueue, JobScheduler};
pub use jobs::{
    secure_job_proxy, EnqueueRequest, JobArgs, JobCall, JobHandle, JobId, JobOptions, JobRegistry,
    JobWorker, QueuedJob, RecurringRequest, ScheduledJob, Schedulers, SecureJob, SecureJobClient,
};
pub use recovery::{DataRecoveryService, RecoveryReport};
pub use serializer::{Codec, JsonCodec, SecureSerializer};
