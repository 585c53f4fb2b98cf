//! End-to-end tests for classroom-convert.
//!
//! These drive the tracker and submitter through the real reqwest dispatcher
//! against a local `wiremock` server standing in for the API.
//!
//! Run with:
//!   RUST_LOG=classroom_convert=debug cargo test --test e2e -- --nocapture

use classroom_convert::{
    ClientConfig, ConversionStep, ConversionTracker, ConvertError, FileRecord, FileRecordStore,
    InMemoryFileStore, ReqwestDispatcher, SubmitError, Submitter, TriggerOutcome,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const START_PATH: &str = "/v1/cloud-storage/convert/start";

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs through the test harness; filtered by `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .token("test-token")
        .request_timeout_secs(2)
        .build()
        .expect("valid config")
}

fn tracker_with(
    config: &ClientConfig,
    records: Vec<FileRecord>,
) -> (ConversionTracker, Arc<InMemoryFileStore>) {
    let store: Arc<InMemoryFileStore> = Arc::new(records.into_iter().collect());
    let dispatcher = Arc::new(ReqwestDispatcher::new(config).expect("client"));
    (
        ConversionTracker::new(store.clone(), dispatcher, config),
        store,
    )
}

async fn step_of(store: &InMemoryFileStore, id: &str) -> ConversionStep {
    store.get(id).await.unwrap().unwrap().conversion_step
}

fn accepted(task: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": 0,
        "data": {"taskUUID": task, "taskToken": "tok-1", "resourceType": "WhiteboardProjector"}
    }))
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_lecture_pptx_is_submitted_and_converting() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(START_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({"fileUUID": "lec-1"})))
        .respond_with(accepted("task-lec-1"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let (tracker, store) = tracker_with(&config, vec![FileRecord::new("lec-1", "lecture.pptx")]);

    let outcome = tracker.trigger("lec-1").await.expect("trigger");
    let TriggerOutcome::Started(response) = outcome else {
        panic!("expected Started, got {outcome:?}");
    };
    assert_eq!(response.task_uuid, "task-lec-1");
    assert_eq!(response.task_token, "tok-1");
    assert_eq!(response.extra["resourceType"], "WhiteboardProjector");
    assert_eq!(step_of(&store, "lec-1").await, ConversionStep::Converting);
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_marks_failed_without_retry() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(START_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let (tracker, store) = tracker_with(&config, vec![FileRecord::new("n1", "notes.docx")]);

    let err = tracker.trigger("n1").await.unwrap_err();
    match err {
        ConvertError::SubmitFailed {
            source: SubmitError::Http { status, ref body },
            ..
        } => {
            assert_eq!(status, 500);
            assert!(body.contains("upstream exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(step_of(&store, "n1").await, ConversionStep::Failed);

    // A second trigger does not re-submit a failed file.
    let again = tracker.trigger("n1").await.unwrap();
    assert_eq!(
        again,
        TriggerOutcome::Skipped {
            step: ConversionStep::Failed
        }
    );
}

#[tokio::test]
async fn test_envelope_rejection_maps_to_api_error() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(START_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": 1, "code": 110001})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let submitter = Submitter::new(Arc::new(ReqwestDispatcher::new(&config).unwrap()), &config);
    let result = submitter.submit("doc-9").unwrap().outcome().await;
    assert_eq!(
        result.unwrap_err(),
        SubmitError::Api {
            status: 1,
            code: Some(110001)
        }
    );
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted("late").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .request_timeout_secs(1)
        .build()
        .unwrap();
    let submitter = Submitter::new(Arc::new(ReqwestDispatcher::new(&config).unwrap()), &config);
    let result = submitter.submit("slow-1").unwrap().outcome().await;
    assert_eq!(result.unwrap_err(), SubmitError::Timeout { secs: 1 });
}

#[tokio::test]
async fn test_network_failure_invokes_callback_exactly_once() {
    init_tracing();
    // Nothing listens on port 1.
    let config = ClientConfig::builder()
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let submitter = Submitter::new(Arc::new(ReqwestDispatcher::new(&config).unwrap()), &config);

    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = tokio::sync::oneshot::channel();
    let seen = Arc::clone(&calls);
    submitter
        .submit_with("abc-123", move |result| {
            seen.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result);
        })
        .unwrap();

    let result = rx.await.expect("callback fired");
    assert!(
        matches!(result, Err(SubmitError::Network { .. })),
        "got {result:?}"
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!submitter.is_in_flight("abc-123"));
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_submits_only_eligible_files() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(START_PATH))
        .and(body_json(json!({"fileUUID": "a"})))
        .respond_with(accepted("task-a"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(START_PATH))
        .and(body_json(json!({"fileUUID": "b"})))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let (tracker, store) = tracker_with(
        &config,
        vec![
            FileRecord::new("a", "https://cdn.example.com/a.PDF"),
            FileRecord::new("b", "https://cdn.example.com/b.pptx"),
            FileRecord::new("c", "https://cdn.example.com/c.png"),
            FileRecord::new("d", "https://cdn.example.com/d.doc").with_step(ConversionStep::Done),
        ],
    );

    let results = tracker.trigger_all().await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(step_of(&store, "a").await, ConversionStep::Converting);
    assert_eq!(step_of(&store, "b").await, ConversionStep::Failed);
    assert_eq!(step_of(&store, "c").await, ConversionStep::None);
    assert_eq!(step_of(&store, "d").await, ConversionStep::Done);
}
