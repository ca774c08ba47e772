//! Catch-all forwarding handler.
//!
//! `ANY {prefix}/rest?query` is relayed as `ANY {upstream}/rest?query` with
//! the same method, headers and body. The upstream's status, headers and
//! body come back as-is (minus hop-by-hop headers); the body is streamed.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Uri};
use axum::response::Response;
use http_body_util::LengthLimitError;
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::state::AppState;

/// Connection-scoped headers a proxy must not forward (RFC 9110 §7.6.1).
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub async fn forward(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Response, GatewayError> {
    let (parts, body) = req.into_parts();
    let config = &state.config;

    let target = upstream_url(&config.upstream_url, &config.path_prefix, &parts.uri);
    let body = axum::body::to_bytes(body, config.max_body_bytes)
        .await
        .map_err(|e| body_error(&e, config.max_body_bytes))?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    // The client sets these for the rewritten target and the buffered body.
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    debug!(method = %parts.method, %target, bytes = body.len(), "forwarding request");
    let upstream = state
        .client
        .request(parts.method.clone(), &target)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    info!(method = %parts.method, %target, status = status.as_u16(), "proxied");

    let mut response_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut response_headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

/// Map an inbound URI onto the upstream base.
///
/// `prefix` must be normalised (leading `/`, no trailing `/`, or empty).
pub fn upstream_url(upstream: &str, prefix: &str, uri: &Uri) -> String {
    let path = uri.path();
    let rest = path.strip_prefix(prefix).unwrap_or(path);
    match uri.query() {
        Some(query) => format!("{upstream}{rest}?{query}"),
        None => format!("{upstream}{rest}"),
    }
}

/// Classify a failure to buffer the inbound body.
fn body_error(e: &axum::Error, limit: usize) -> GatewayError {
    let too_large =
        std::error::Error::source(e).is_some_and(|inner| inner.is::<LengthLimitError>());
    if too_large {
        GatewayError::PayloadTooLarge { limit }
    } else {
        GatewayError::BodyInterrupted(e.to_string())
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
