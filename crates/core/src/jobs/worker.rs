use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::ports::JobQueue;
use super::proxy::secure_job_proxy;
use super::registry::JobRegistry;
use super::types::{JobArgs, JobId, JobStatus, QueuedJob};
use crate::constants::SECURE_JOB_PROXY;
use crate::errors::{SecureCacheError, SecureCacheResult};
use crate::serializer::SecureSerializer;

/// Result of running one dequeued job.
#[derive(Debug)]
pub struct JobRun {
    pub id: JobId,
    pub result: SecureCacheResult<Value>,
}

/// Executes dequeued jobs.
///
/// Proxy jobs are decrypted and dispatched through [`secure_job_proxy`];
/// anything else (recurring entries) is dispatched straight from the
/// registry with its stored arguments.
#[derive(Debug, Clone)]
pub struct JobWorker {
    registry: Arc<JobRegistry>,
    serializer: Arc<SecureSerializer>,
}

impl JobWorker {
    pub fn new(registry: Arc<JobRegistry>, serializer: Arc<SecureSerializer>) -> Self {
        Self { registry, serializer }
    }

    pub fn perform(&self, job: &QueuedJob) -> SecureCacheResult<Value> {
        let request = &job.request;
        if request.target == SECURE_JOB_PROXY {
            return secure_job_proxy(&self.registry, &self.serializer, &request.args);
        }

        let function = self.registry.resolve(&request.target)?;
        function(JobArgs { args: request.args.clone(), kwargs: request.kwargs.clone() })
            .map_err(SecureCacheError::Job)
    }

    /// Dequeue and run at most one job, recording its status on the queue.
    pub async fn work_once(
        &self,
        queue: &dyn JobQueue,
        queue_name: &str,
    ) -> SecureCacheResult<Option<JobRun>> {
        let Some(job) = queue.dequeue(queue_name).await? else {
            return Ok(None);
        };

        let result = self.perform(&job);
        let status = match &result {
            Ok(_) => {
                info!(job_id = %job.id, queue = queue_name, "job finished");
                JobStatus::Finished
            }
            Err(err) => {
                warn!(job_id = %job.id, queue = queue_name, error = %err, "job failed");
                JobStatus::Failed
            }
        };
        queue.complete(&job.id, status).await?;

        Ok(Some(JobRun { id: job.id, result }))
    }
}
