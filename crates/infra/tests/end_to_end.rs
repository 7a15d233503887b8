//! End-to-end tests over the in-memory adapters.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use securecache_core::jobs::JobStatus;
use securecache_core::{
    CacheOptions, CacheSettings, DataRecoverySettings, JobArgs, JobCall, JobOptions,
    SecureCacheError, SecureCacheSettings,
};
use securecache_infra::SecureCacheStack;
use serde_json::{json, Value};

const TEST_KEY: &str = "kPEDO_pSrPh3qGJVfGAflLZXKAh4AuHU64tTlP-f_PY=";

fn settings(recovery: Option<DataRecoverySettings>) -> SecureCacheSettings {
    let mut settings = SecureCacheSettings::default();
    settings.caches.insert(
        "default".into(),
        CacheSettings {
            key_prefix: "register:secure".into(),
            options: Some(CacheOptions {
                secret_key: Some(TEST_KEY.into()),
                data_recovery: recovery,
                ..CacheOptions::default()
            }),
            ..CacheSettings::default()
        },
    );
    settings.caches.insert(
        "unsafe_redis".into(),
        CacheSettings { key_prefix: "register".into(), ..CacheSettings::default() },
    );
    settings
}

#[tokio::test]
async fn test_val_123_round_trip() {
    let stack = SecureCacheStack::in_memory(&settings(None)).expect("stack");

    stack.cache.set("val", "123").await.expect("set");

    let raw = stack.backend.raw("register:secure:1:val").expect("stored");
    assert_ne!(raw, b"123");
    assert!(!String::from_utf8_lossy(&raw).contains("123"));
    assert_eq!(stack.cache.get::<String>("val").await.expect("get").as_deref(), Some("123"));
}

#[tokio::test]
async fn test_incr_refused_without_writes() {
    let stack = SecureCacheStack::in_memory(&settings(None)).expect("stack");

    let result = stack.cache.incr("counter", 1).await;

    assert!(matches!(result, Err(SecureCacheError::UnsupportedOperation(_))));
    assert_eq!(stack.backend.write_count(), 0);
}

#[tokio::test]
async fn test_job_round_trip_through_queue() {
    let stack = SecureCacheStack::in_memory(&settings(None)).expect("stack");
    let seen: Arc<Mutex<Vec<JobArgs>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let job = stack
        .jobs
        .register("mail.send", JobOptions::default(), move |args: JobArgs| {
            sink.lock().unwrap().push(args);
            Ok(Value::Null)
        })
        .expect("register");

    let handle = job
        .enqueue_now(JobCall::new().arg(1).arg(2).kwarg("param1", "A"))
        .await
        .expect("enqueue");

    let stored = stack.queue.request(&handle.id).expect("stored request");
    let text = serde_json::to_string(&stored).expect("json");
    assert!(!text.contains("param1"));
    assert!(!text.contains("mail.send"));

    let run = stack.jobs.worker().work_once(stack.queue.as_ref(), "default").await.unwrap();
    assert!(run.expect("job ran").result.is_ok());
    assert_eq!(
        securecache_core::JobQueue::status(stack.queue.as_ref(), &handle.id).await.unwrap(),
        Some(JobStatus::Finished)
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].args, vec![json!(1), json!(2)]);
    assert_eq!(seen[0].kwargs.get("param1"), Some(&json!("A")));
}

#[tokio::test]
async fn test_dependent_job_waits_for_parent() {
    let stack = SecureCacheStack::in_memory(&settings(None)).expect("stack");
    let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&order);
    let job = stack
        .jobs
        .register("step", JobOptions::default(), move |args: JobArgs| {
            sink.lock().unwrap().push(args.arg::<String>(0)?);
            Ok(Value::Null)
        })
        .expect("register");

    let parent = job.enqueue_now(JobCall::new().arg("first")).await.expect("enqueue");
    job.enqueue_now(JobCall::new().arg("second").depends_on(parent.id.clone()))
        .await
        .expect("enqueue");
    assert_eq!(stack.queue.len("default"), 1);

    let worker = stack.jobs.worker();
    worker.work_once(stack.queue.as_ref(), "default").await.unwrap();
    worker.work_once(stack.queue.as_ref(), "default").await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["first".to_string(), "second".to_string()]);
}

#[tokio::test]
async fn test_recurring_job_fires_from_scheduler() {
    let stack = SecureCacheStack::in_memory(&settings(None)).expect("stack");
    let count = Arc::new(Mutex::new(0u32));
    let sink = Arc::clone(&count);
    let job = stack
        .jobs
        .register("cleanup", JobOptions::default(), move |_args: JobArgs| {
            *sink.lock().unwrap() += 1;
            Ok(Value::Null)
        })
        .expect("register");

    assert!(job.schedule_recurring(Duration::from_secs(60), None).await.unwrap().is_some());
    assert!(job.schedule_recurring(Duration::from_secs(60), None).await.unwrap().is_none());
    assert!(job.schedule_recurring(Duration::from_secs(120), None).await.unwrap().is_some());
    assert_eq!(stack.scheduler.len(), 1);

    let fired = stack
        .scheduler
        .enqueue_due(Utc::now() + chrono::Duration::seconds(1), stack.queue.as_ref())
        .await
        .unwrap();
    assert_eq!(fired.len(), 1);

    stack.jobs.worker().work_once(stack.queue.as_ref(), "default").await.unwrap();
    assert_eq!(*count.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_legacy_entries_recovered() {
    let recovery = DataRecoverySettings {
        old_key_prefix: "register".into(),
        old_cache_name: "unsafe_redis".into(),
        clear_old_entries: true,
    };
    let stack = SecureCacheStack::in_memory(&settings(Some(recovery))).expect("stack");
    let legacy = stack.legacy_cache().expect("legacy client");
    legacy.set("session", &json!({"user": 7})).await.expect("seed");

    let report = stack.recover_legacy_entries().await.unwrap().expect("report");

    assert_eq!(report.copied, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(stack.cache.get::<Value>("session").await.unwrap(), Some(json!({"user": 7})));
    assert!(stack.backend.raw("register:1:session").is_none());
}
