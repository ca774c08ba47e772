//! Mock backend speaking the `submitQuery` / `getQuery` contract.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query as QueryParams, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rag_query_client::{Query, SubmitQueryRequest};
use serde::Deserialize;

#[derive(Clone, Default)]
pub struct MockBackend {
    jobs: Arc<Mutex<HashMap<String, Query>>>,
    pub received: Arc<Mutex<Vec<SubmitQueryRequest>>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetParams {
    query_id: String,
}

impl MockBackend {
    /// Serve on an ephemeral local port; returns the base URL.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/submitQuery", post(submit))
            .route("/getQuery", get(fetch))
            .route("/boom/submitQuery", post(boom))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// What the worker does once the answer is ready.
    pub fn complete(&self, query_id: &str, answer: &str, sources: &[&str]) {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(query_id).expect("unknown job");
        job.answer_text = Some(answer.to_owned());
        job.sources = sources.iter().map(|s| s.to_string()).collect();
        job.is_complete = true;
    }
}

async fn submit(
    State(backend): State<MockBackend>,
    Json(req): Json<SubmitQueryRequest>,
) -> Json<Query> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let job = Query::pending(&id, &req.query_text, &req.user_id);
    backend.jobs.lock().unwrap().insert(id, job.clone());
    backend.received.lock().unwrap().push(req);
    Json(job)
}

async fn fetch(State(backend): State<MockBackend>, QueryParams(p): QueryParams<GetParams>) -> Response {
    match backend.jobs.lock().unwrap().get(&p.query_id) {
        Some(job) => Json(job.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn boom() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "worker crashed").into_response()
}
