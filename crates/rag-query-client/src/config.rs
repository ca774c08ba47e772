//! API client configuration.
//!
//! The base address is the only recognised option. It is resolved with the
//! precedence explicit override > `RAG_API_BASE_URL` > compiled-in default.

use std::time::Duration;

/// Environment variable selecting the API base address.
pub const BASE_URL_ENV: &str = "RAG_API_BASE_URL";

/// Deployed backend endpoint used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str =
    "https://bpve3nbtfqav4lskuxeeperrzq0qdgki.lambda-url.us-east-1.on.aws";

/// Per-request timeout applied to both backend operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base address without a trailing `/`, e.g. `http://localhost:3000/api`.
    pub base_url: String,
    /// Applied to every request; expiry surfaces as a transport error.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

impl ApiConfig {
    /// Resolve against the process environment.
    pub fn from_env(explicit: Option<&str>) -> Self {
        let env = std::env::var(BASE_URL_ENV).ok();
        Self::resolve(explicit, env.as_deref())
    }

    /// Resolve from explicit values. Empty strings count as unset.
    pub fn resolve(explicit: Option<&str>, env: Option<&str>) -> Self {
        let base = [explicit, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|v| !v.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);

        Self {
            base_url: base.trim_end_matches('/').to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
