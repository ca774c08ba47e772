//! Typed contract for the backend's two operations.
//!
//! [`QueryApi`] is the seam used by the submission flow and the viewer;
//! [`ApiClient`] is the HTTP implementation. Trait methods return
//! `impl Future` (stable since Rust 1.75) so no `async-trait` is needed.

use std::future::Future;

use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::QueryError;
use crate::models::{Query, SubmitQueryRequest};

pub const SUBMIT_QUERY_PATH: &str = "/submitQuery";
pub const GET_QUERY_PATH: &str = "/getQuery";

/// Longest slice of an error body kept in [`QueryError::Server`].
const MAX_ERROR_BODY_CHARS: usize = 256;

/// The backend operations. Pure request/response: no retries, no caching.
pub trait QueryApi: Send + Sync {
    /// Create a job. The returned snapshot is incomplete and has an id.
    fn submit_query(
        &self,
        query_text: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Query, QueryError>> + Send;

    /// Fetch the current snapshot of a job.
    fn get_query(&self, query_id: &str) -> impl Future<Output = Result<Query, QueryError>> + Send;
}

/// HTTP implementation of [`QueryApi`] on top of `reqwest`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, QueryError> {
        let client = Client::builder()
            .user_agent(concat!("rag-query-client/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, QueryError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| QueryError::Transport(format!("invalid address {raw}: {e}")))
    }
}

impl QueryApi for ApiClient {
    async fn submit_query(&self, query_text: &str, user_id: &str) -> Result<Query, QueryError> {
        let url = self.endpoint(SUBMIT_QUERY_PATH)?;
        let body = SubmitQueryRequest {
            query_text: query_text.to_owned(),
            user_id: user_id.to_owned(),
        };
        debug!(%url, user_id, "submitting query");

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        let bytes = success_body(response).await?;

        let query: Query = decode(status, &bytes)?;
        if query.query_id.is_empty() {
            return Err(QueryError::Server {
                status: status.as_u16(),
                message: "backend returned an empty queryId".to_owned(),
            });
        }
        debug!(query_id = %query.query_id, "query submitted");
        Ok(query)
    }

    async fn get_query(&self, query_id: &str) -> Result<Query, QueryError> {
        let mut url = self.endpoint(GET_QUERY_PATH)?;
        url.query_pairs_mut().append_pair("queryId", query_id);
        debug!(%url, "fetching query");

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(QueryError::NotFound(query_id.to_owned()));
        }
        let status = response.status();
        let bytes = success_body(response).await?;

        // Some backends answer an unknown id with `200 null`.
        let snapshot: Option<Query> = decode(status, &bytes)?;
        snapshot.ok_or_else(|| QueryError::NotFound(query_id.to_owned()))
    }
}

/// Read the body of a 2xx response, or turn anything else into
/// [`QueryError::Server`].
async fn success_body(response: Response) -> Result<Vec<u8>, QueryError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if status.is_success() {
        return Ok(bytes.to_vec());
    }

    let text = String::from_utf8_lossy(&bytes);
    let message = match text.trim() {
        "" => status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned(),
        t => t.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    };
    Err(QueryError::Server {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: serde::de::DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T, QueryError> {
    serde_json::from_slice(bytes).map_err(|e| QueryError::Server {
        status: status.as_u16(),
        message: format!("malformed response body: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(ApiConfig::resolve(Some(base), None)).unwrap()
    }

    /// Serve `app` on an ephemeral port and return a client with a short timeout.
    async fn stub(app: Router) -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ApiClient::new(
            ApiConfig::resolve(Some(&format!("http://{addr}")), None)
                .with_timeout(Duration::from_millis(300)),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let api = client("http://localhost:3000/api/");
        assert_eq!(api.base_url(), "http://localhost:3000/api");
        assert_eq!(
            api.endpoint(SUBMIT_QUERY_PATH).unwrap().as_str(),
            "http://localhost:3000/api/submitQuery"
        );
    }

    #[test]
    fn invalid_base_is_a_transport_error() {
        let api = client("not a url");
        let err = api.endpoint(GET_QUERY_PATH).unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        // Bind and immediately drop a listener to get a port nobody serves.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = ApiClient::new(
            ApiConfig::resolve(Some(&format!("http://{addr}")), None)
                .with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let err = api.get_query("q1").await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn null_snapshot_is_not_found() {
        let api = stub(Router::new().route("/getQuery", get(|| async { Json(Value::Null) }))).await;
        let err = api.get_query("x").await.unwrap_err();
        assert!(matches!(err, QueryError::NotFound(ref id) if id == "x"), "got {err:?}");
    }

    #[tokio::test]
    async fn undecodable_snapshot_is_a_server_error() {
        let api = stub(Router::new().route("/getQuery", get(|| async { "not json" }))).await;
        let err = api.get_query("x").await.unwrap_err();
        assert!(matches!(err, QueryError::Server { status: 200, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_query_id_from_submit_is_a_server_error() {
        let app = Router::new().route(
            "/submitQuery",
            post(|| async {
                Json(json!({ "queryId": "", "queryText": "q", "userId": "u", "isComplete": false }))
            }),
        );
        let api = stub(app).await;
        let err = api.submit_query("q", "u").await.unwrap_err();
        assert!(matches!(err, QueryError::Server { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_backend_is_a_transport_error() {
        let app = Router::new().route(
            "/getQuery",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(Value::Null)
            }),
        );
        let api = stub(app).await;
        let err = api.get_query("x").await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)), "got {err:?}");
    }
}
