//! Errors the gateway itself originates.
//!
//! Upstream responses, including 4xx/5xx, are relayed untouched and never
//! become a [`GatewayError`]. Only failures to complete the exchange do.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The upstream could not be reached or the exchange broke off.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The upstream did not answer within the configured timeout.
    #[error("upstream timed out")]
    Timeout,

    /// The request body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The inbound request body broke off before it was fully read.
    #[error("request body interrupted: {0}")]
    BodyInterrupted(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            GatewayError::Unreachable(detail) => {
                error!(error = %detail, "upstream unreachable");
                (StatusCode::BAD_GATEWAY, "upstream unreachable".to_owned())
            }
            GatewayError::Timeout => {
                warn!("upstream timed out");
                (StatusCode::GATEWAY_TIMEOUT, "upstream timed out".to_owned())
            }
            GatewayError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            GatewayError::BodyInterrupted(detail) => {
                warn!(error = %detail, "request body interrupted");
                (StatusCode::BAD_GATEWAY, "request body interrupted".to_owned())
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            // Keep the full chain for the log; reqwest's Display alone is terse.
            let mut detail = e.to_string();
            let mut source = std::error::Error::source(&e);
            while let Some(inner) = source {
                detail = format!("{detail}: {inner}");
                source = inner.source();
            }
            GatewayError::Unreachable(detail)
        }
    }
}
