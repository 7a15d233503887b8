//! Integration tests for encrypted job enqueueing, scheduling and execution.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use securecache_core::config::QueueSettings;
use securecache_core::constants::SECURE_JOB_PROXY;
use securecache_core::{
    JobArgs, JobCall, JobId, JobOptions, JobRegistry, Schedulers, SecureCacheError, SecureJob,
    SecureJobClient, SecureSerializer,
};
use serde_json::{json, Value};
use support::backends::{RecordingQueue, RecordingScheduler};
use support::TEST_KEY;

struct Harness {
    client: SecureJobClient,
    queue: RecordingQueue,
    scheduler: RecordingScheduler,
    calls: Arc<Mutex<Vec<JobArgs>>>,
}

fn harness_with(queue_settings: QueueSettings) -> Harness {
    harness_on(RecordingScheduler::new(), queue_settings)
}

fn harness_on(scheduler: RecordingScheduler, queue_settings: QueueSettings) -> Harness {
    let queue = RecordingQueue::new();
    let serializer = SecureSerializer::from_key(TEST_KEY).expect("serializer");
    let client = SecureJobClient::new(
        Arc::new(serializer),
        Arc::new(JobRegistry::new()),
        Arc::new(queue.clone()),
        Schedulers::single(Arc::new(scheduler.clone())),
        queue_settings,
    );
    Harness { client, queue, scheduler, calls: Arc::new(Mutex::new(Vec::new())) }
}

fn harness() -> Harness {
    harness_with(QueueSettings::default())
}

fn register_recording(h: &Harness, id: &str) -> SecureJob {
    let calls = Arc::clone(&h.calls);
    h.client
        .register(id, JobOptions::default(), move |args: JobArgs| {
            let a: i64 = args.arg(0)?;
            let b: i64 = args.arg(1)?;
            calls.lock().unwrap().push(args);
            Ok(json!(a + b))
        })
        .expect("register")
}

/// Validates `SecureJob::enqueue_now` behavior for the encrypted arguments scenario.
///
/// Assertions:
/// - The queue stores the proxy target and three opaque string tokens
/// - No argument, keyword name or job id appears in the stored request
/// - The worker calls the function with exactly the original arguments
#[tokio::test]
async fn enqueue_now_hides_arguments_and_runs_original_call() {
    let h = harness();
    let job = register_recording(&h, "billing.add");

    job.enqueue_now(JobCall::new().arg(1).arg(2).kwarg("param1", "A")).await.expect("enqueue");

    let requests = h.queue.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.target, SECURE_JOB_PROXY);
    assert_eq!(request.args.len(), 3);
    assert!(request.args.iter().all(Value::is_string));
    assert!(request.kwargs.is_empty());

    let stored = serde_json::to_string(request).expect("json");
    assert!(!stored.contains("param1"));
    assert!(!stored.contains("\"A\""));
    assert!(!stored.contains("billing.add"));
    assert!(!stored.contains("[1,2]"));

    let run = h.client.worker().work_once(&h.queue, "default").await.expect("work").expect("job");
    assert_eq!(run.result.expect("result"), json!(3));

    let calls = h.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args, vec![json!(1), json!(2)]);
    assert_eq!(calls[0].kwargs.get("param1"), Some(&json!("A")));
    assert_eq!(calls[0].kwargs.len(), 1);
}

/// Validates `SecureJob::enqueue_now` behavior for the job dependency scenario.
///
/// Assertions:
/// - `depends_on` is carried as queue metadata
/// - The dependency never reaches the function's keyword arguments
#[tokio::test]
async fn dependency_travels_outside_encrypted_arguments() {
    let h = harness();
    let job = register_recording(&h, "billing.add");
    let parent = JobId::from("parent-job");

    job.enqueue_now(JobCall::new().arg(1).arg(2).depends_on(parent.clone()))
        .await
        .expect("enqueue");

    let request = &h.queue.requests()[0];
    assert_eq!(request.depends_on.as_ref(), Some(&parent));

    h.client.worker().work_once(&h.queue, "default").await.expect("work");
    let calls = h.calls.lock().unwrap();
    assert!(calls[0].kwargs.is_empty());
}

/// Validates `SecureJob::enqueue_at` behavior for the named scheduler scenario.
///
/// Assertions:
/// - The scheduler receives an encrypted request at the requested time
/// - An unknown scheduler name is a configuration error
#[tokio::test]
async fn enqueue_at_uses_named_scheduler() {
    let h = harness();
    let job = register_recording(&h, "billing.add");
    let at = Utc::now() + ChronoDuration::minutes(5);

    let handle =
        job.enqueue_at(at, "default", JobCall::new().arg(4).arg(5)).await.expect("enqueue_at");
    assert_eq!(handle.scheduled_for, Some(at));

    let entries = h.scheduler.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].target, SECURE_JOB_PROXY);
    assert_eq!(entries[0].next_run, at);
    assert!(!serde_json::to_string(&entries[0].request).expect("json").contains("billing.add"));

    let missing = job.enqueue_at(at, "reports", JobCall::new()).await;
    assert!(matches!(missing, Err(SecureCacheError::Config(_))));
}

/// Validates `SecureJob::schedule_recurring` behavior for the reconciliation scenario.
///
/// Assertions:
/// - Repeating the same interval leaves exactly one entry untouched
/// - Changing the interval replaces the entry with a single new one
#[tokio::test]
async fn schedule_recurring_is_idempotent_and_replaces_changes() {
    let h = harness();
    let job = register_recording(&h, "reports.nightly");

    let first = job.schedule_recurring(Duration::from_secs(60), None).await.expect("schedule");
    assert!(first.is_some());
    let second = job.schedule_recurring(Duration::from_secs(60), None).await.expect("schedule");
    assert!(second.is_none());
    assert_eq!(h.scheduler.entries().len(), 1);
    assert!(h.scheduler.cancelled().is_empty());

    let third = job.schedule_recurring(Duration::from_secs(120), None).await.expect("schedule");
    assert!(third.is_some());
    let entries = h.scheduler.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].interval, Some(Duration::from_secs(120)));
    assert_eq!(h.scheduler.cancelled().len(), 1);
}

/// Validates `SecureJob::schedule_recurring` behavior for the duplicate entries scenario.
///
/// Assertions:
/// - Two matching entries are both cancelled and replaced by one
/// - Entries for other jobs are left alone
#[tokio::test]
async fn schedule_recurring_collapses_duplicates() {
    let h = harness();
    let job = register_recording(&h, "reports.nightly");
    let timeout = Duration::from_secs(360);
    h.scheduler.seed_recurring("reports.nightly", Duration::from_secs(60), timeout);
    h.scheduler.seed_recurring("reports.nightly", Duration::from_secs(60), timeout);
    h.scheduler.seed_recurring("other.job", Duration::from_secs(60), timeout);

    let handle = job.schedule_recurring(Duration::from_secs(60), None).await.expect("schedule");
    assert!(handle.is_some());

    let entries = h.scheduler.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.iter().filter(|e| e.target == "reports.nightly").count(), 1);
    assert_eq!(h.scheduler.cancelled().len(), 2);
}

/// Validates `SecureJob::schedule_recurring` behavior for one function
/// registered under two identifiers.
///
/// Assertions:
/// - Each identifier gets its own recurring entry
/// - Scheduling the second never cancels the first
/// - Re-scheduling one identifier is a no-op regardless of the other
#[tokio::test]
async fn schedule_recurring_keeps_aliases_independent() {
    let h = harness();
    let shared = |_args: JobArgs| Ok(json!("done"));
    let first = h.client.register("reports.a", JobOptions::default(), shared).expect("register a");
    let second = h.client.register("reports.b", JobOptions::default(), shared).expect("register b");

    assert!(first.schedule_recurring(Duration::from_secs(60), None).await.expect("a").is_some());
    assert!(second.schedule_recurring(Duration::from_secs(60), None).await.expect("b").is_some());

    let mut targets: Vec<String> = h.scheduler.entries().into_iter().map(|e| e.target).collect();
    targets.sort();
    assert_eq!(targets, vec!["reports.a".to_string(), "reports.b".to_string()]);
    assert!(h.scheduler.cancelled().is_empty());

    assert!(first.schedule_recurring(Duration::from_secs(60), None).await.expect("a").is_none());
    assert_eq!(h.scheduler.entries().len(), 2);
    assert!(h.scheduler.cancelled().is_empty());
}

/// Validates `SecureJob::schedule_recurring` behavior for the first run time.
///
/// Assertions:
/// - The first run is read from the scheduler's clock, not the wall clock
#[tokio::test]
async fn schedule_recurring_first_run_uses_scheduler_clock() {
    let frozen = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("timestamp");
    let h = harness_on(RecordingScheduler::frozen_at(frozen), QueueSettings::default());
    let job = register_recording(&h, "reports.hourly");

    let handle = job
        .schedule_recurring(Duration::from_secs(3600), None)
        .await
        .expect("schedule")
        .expect("new entry");

    assert_eq!(handle.scheduled_for, Some(frozen));
    assert_eq!(h.scheduler.entries()[0].next_run, frozen);
}

/// Validates `SecureJob::schedule_recurring` behavior for the timeout fallback scenario.
///
/// Assertions:
/// - Without a queue default the timeout is 360 seconds
/// - A configured queue default is used when no timeout is passed
/// - An explicit timeout wins over both
#[tokio::test]
async fn schedule_recurring_timeout_fallbacks() {
    let h = harness();
    let job = register_recording(&h, "a");
    job.schedule_recurring(Duration::from_secs(60), None).await.expect("schedule");
    assert_eq!(h.scheduler.entries()[0].timeout, Some(Duration::from_secs(360)));

    let h = harness_with(QueueSettings { default_timeout_secs: Some(90) });
    let job = register_recording(&h, "a");
    job.schedule_recurring(Duration::from_secs(60), None).await.expect("schedule");
    assert_eq!(h.scheduler.entries()[0].timeout, Some(Duration::from_secs(90)));

    job.schedule_recurring(Duration::from_secs(60), Some(Duration::from_secs(30)))
        .await
        .expect("schedule");
    let entries = h.scheduler.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].timeout, Some(Duration::from_secs(30)));
}

/// Validates `SecureJob::schedule_recurring` behavior for the zero interval scenario.
///
/// Assertions:
/// - A zero interval is rejected before the scheduler is touched
#[tokio::test]
async fn schedule_recurring_rejects_zero_interval() {
    let h = harness();
    let job = register_recording(&h, "a");
    let result = job.schedule_recurring(Duration::ZERO, None).await;
    assert!(matches!(result, Err(SecureCacheError::Config(_))));
    assert!(h.scheduler.entries().is_empty());
}

/// Validates `JobWorker` behavior for the failing job scenario.
///
/// Assertions:
/// - The function's own error comes back unchanged
#[tokio::test]
async fn worker_surfaces_job_errors() {
    let h = harness();
    let job = h
        .client
        .register("always.fails", JobOptions::default(), |_args| {
            Err(anyhow::anyhow!("ledger closed"))
        })
        .expect("register");
    job.enqueue_now(JobCall::new()).await.expect("enqueue");

    let run = h.client.worker().work_once(&h.queue, "default").await.expect("work").expect("job");
    match run.result {
        Err(SecureCacheError::Job(err)) => assert_eq!(err.to_string(), "ledger closed"),
        other => panic!("unexpected result: {other:?}"),
    }
}

/// Validates `SecureJobClient::job` behavior for the unregistered target scenario.
///
/// Assertions:
/// - Asking for a handle of an unknown id fails
#[test]
fn unknown_job_handle_is_rejected() {
    let h = harness();
    let result = h.client.job("missing", JobOptions::default());
    assert!(matches!(result, Err(SecureCacheError::UnknownJobTarget(ref id)) if id == "missing"));
}
