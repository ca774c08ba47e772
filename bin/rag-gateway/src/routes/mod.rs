//! Axum router construction.
//!
//! [`build`] assembles the gateway router:
//! - Middleware layers (per-request trace span, permissive CORS)
//! - Health / heartbeat route at `/health`
//! - Catch-all proxy under the configured prefix

mod health;
pub mod proxy;

use std::sync::Arc;

use axum::routing::any;
use axum::{middleware, Router};

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the gateway.
pub fn build(state: Arc<AppState>) -> Router {
    let prefix = state.config.path_prefix.clone();

    let app = if prefix.is_empty() {
        health::router().fallback(proxy::forward)
    } else {
        health::router()
            .route(&prefix, any(proxy::forward))
            .route(&format!("{prefix}/"), any(proxy::forward))
            .route(&format!("{prefix}/{{*rest}}"), any(proxy::forward))
    };

    // Outermost layer runs first on the way in.
    cors::permissive(app)
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
