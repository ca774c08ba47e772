//! Shared application state injected into every Axum handler.

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;

use crate::config::Config;

/// State shared across all HTTP handlers.
///
/// Holds no per-request data; the client is a connection pool.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Gateway configuration (env-derived).
    pub config: Arc<Config>,
    /// Pooled client for upstream calls. Redirects are relayed, not followed.
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rag-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}
