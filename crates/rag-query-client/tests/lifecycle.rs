mod common;

use std::sync::Arc;

use common::MockBackend;
use rag_query_client::{
    ApiClient, ApiConfig, EphemeralIdentity, QueryApi, QueryError, QueryViewer, SubmissionFlow,
    SubmitState, ViewState, PLACEHOLDER_QUESTION,
};

async fn setup() -> (MockBackend, ApiClient) {
    let backend = MockBackend::default();
    let base = backend.start().await;
    let api = ApiClient::new(ApiConfig::resolve(Some(&base), None)).unwrap();
    (backend, api)
}

#[tokio::test]
async fn submit_returns_incomplete_query_with_id() {
    let (_backend, api) = setup().await;

    let query = api.submit_query("What improves sleep?", "user-1").await.unwrap();

    assert!(!query.query_id.is_empty());
    assert!(!query.is_complete);
    assert_eq!(query.answer_text, None);
    assert_eq!(query.query_text, "What improves sleep?");
    assert_eq!(query.user_id, "user-1");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let (_backend, api) = setup().await;

    let err = api.get_query("never-issued").await.unwrap_err();

    assert!(matches!(err, QueryError::NotFound(ref id) if id == "never-issued"));
}

#[tokio::test]
async fn non_success_status_is_server_error() {
    let backend = MockBackend::default();
    let base = backend.start().await;
    let api = ApiClient::new(ApiConfig::resolve(Some(&format!("{base}/boom")), None)).unwrap();

    let err = api.submit_query("q", "u").await.unwrap_err();

    match err {
        QueryError::Server { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("worker crashed"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn polling_is_stable_before_and_after_completion() {
    let (backend, api) = setup().await;
    let query = api.submit_query("What is NSDR?", "user-1").await.unwrap();

    for _ in 0..3 {
        let snapshot = api.get_query(&query.query_id).await.unwrap();
        assert!(!snapshot.is_complete);
    }

    backend.complete(&query.query_id, "Non-sleep deep rest.", &["ep1:3", "ep7:1"]);

    for _ in 0..3 {
        let snapshot = api.get_query(&query.query_id).await.unwrap();
        assert!(snapshot.is_complete);
        assert_eq!(snapshot.answer_text.as_deref(), Some("Non-sleep deep rest."));
        assert_eq!(snapshot.sources, vec!["ep1:3", "ep7:1"]);
    }
}

#[tokio::test]
async fn submit_then_view_end_to_end() {
    let (backend, api) = setup().await;
    let api = Arc::new(api);
    let flow = SubmissionFlow::new(api.clone(), Arc::new(EphemeralIdentity::new()));

    let query = flow.submit("").await.unwrap();
    assert_eq!(
        backend.received.lock().unwrap()[0].query_text,
        PLACEHOLDER_QUESTION
    );
    let query_id = match flow.state() {
        SubmitState::Navigated { query_id } => query_id,
        other => panic!("unexpected state {other:?}"),
    };
    assert_eq!(query_id, query.query_id);

    let viewer = QueryViewer::new(api.clone(), query_id.clone());
    viewer.refresh().await;
    assert!(viewer.render().is_processing());

    backend.complete(&query_id, "Get morning sunlight.", &["a", "b"]);
    let view = viewer.refresh().await;
    assert!(matches!(view, ViewState::Result(ref q) if q.is_complete));

    let rendered = viewer.render();
    assert_eq!(rendered.answer(), Some("Get morning sunlight."));
    let labels: Vec<_> = rendered.sources().map(|s| s.label.clone()).collect();
    assert_eq!(labels, vec!["a", "b"]);
}
