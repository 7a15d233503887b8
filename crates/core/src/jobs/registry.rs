use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::types::JobArgs;
use crate::constants::SECURE_JOB_PROXY;
use crate::errors::{SecureCacheError, SecureCacheResult};

/// A job function. Errors are returned to the worker unchanged.
pub type JobFn = Arc<dyn Fn(JobArgs) -> anyhow::Result<Value> + Send + Sync>;

/// Explicit map from job identifier to function, populated at startup.
///
/// Recurring schedules are matched on the identifier a function was
/// registered under, so one function registered twice under different
/// identifiers yields two independent jobs.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobFn>>,
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry").field("jobs", &self.ids()).finish()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` under `id`. Identifiers are unique.
    pub fn register<F>(&self, id: impl Into<String>, job: F) -> SecureCacheResult<()>
    where
        F: Fn(JobArgs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let id = id.into();
        if id.is_empty() || id == SECURE_JOB_PROXY {
            return Err(SecureCacheError::config(format!("'{id}' cannot be used as a job id")));
        }

        let mut jobs = self.jobs.write();
        if jobs.contains_key(&id) {
            return Err(SecureCacheError::config(format!("job '{id}' is already registered")));
        }
        debug!(job = %id, "registered job");
        jobs.insert(id, Arc::new(job));
        Ok(())
    }

    /// Look up a job function by identifier.
    pub fn resolve(&self, id: &str) -> SecureCacheResult<JobFn> {
        self.jobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SecureCacheError::UnknownJobTarget(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.jobs.read().contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.jobs.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}
