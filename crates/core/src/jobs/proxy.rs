//! Proxy entry-point for encrypted jobs.
//!
//! A queue only ever sees [`SECURE_JOB_PROXY`](crate::constants::SECURE_JOB_PROXY)
//! as the target and three opaque tokens as arguments, in this order:
//! function identifier, positional arguments, keyword arguments.

use securecache_common::CommonError;
use serde_json::{Map, Value};
use tracing::debug;

use super::registry::JobRegistry;
use super::types::JobArgs;
use crate::errors::{SecureCacheError, SecureCacheResult};
use crate::serializer::SecureSerializer;

/// Encrypt the three parts of an invocation independently.
pub(crate) fn seal_invocation(
    serializer: &SecureSerializer,
    job_id: &str,
    call: &JobArgs,
) -> SecureCacheResult<Vec<Value>> {
    [serializer.dumps(job_id)?, serializer.dumps(&call.args)?, serializer.dumps(&call.kwargs)?]
        .into_iter()
        .map(|token| {
            String::from_utf8(token)
                .map(Value::String)
                .map_err(|e| {
                    SecureCacheError::from(CommonError::serialization(format!(
                        "token is not text: {e}"
                    )))
                })
        })
        .collect()
}

/// Decrypt the three proxy arguments.
pub(crate) fn open_invocation(
    serializer: &SecureSerializer,
    args: &[Value],
) -> SecureCacheResult<(String, JobArgs)> {
    let [id, positional, keyword] = args else {
        return Err(SecureCacheError::InvalidJobPayload(format!(
            "expected 3 encrypted arguments, got {}",
            args.len()
        )));
    };

    let job_id: String = serializer.loads(token_bytes(id, "function identifier")?)?;
    let args: Vec<Value> = serializer.loads(token_bytes(positional, "positional arguments")?)?;
    let kwargs: Map<String, Value> = serializer.loads(token_bytes(keyword, "keyword arguments")?)?;
    Ok((job_id, JobArgs { args, kwargs }))
}

fn token_bytes<'a>(value: &'a Value, part: &str) -> SecureCacheResult<&'a [u8]> {
    value
        .as_str()
        .map(str::as_bytes)
        .ok_or_else(|| SecureCacheError::InvalidJobPayload(format!("{part} token is not a string")))
}

/// Decrypt, resolve and invoke an encrypted job.
///
/// The function's own return value and error are passed through unchanged;
/// an error raised by the job arrives as [`SecureCacheError::Job`].
pub fn secure_job_proxy(
    registry: &JobRegistry,
    serializer: &SecureSerializer,
    args: &[Value],
) -> SecureCacheResult<Value> {
    let (job_id, call) = open_invocation(serializer, args)?;
    let job = registry.resolve(&job_id)?;
    debug!(job = %job_id, "dispatching encrypted job");
    job(call).map_err(SecureCacheError::Job)
}
