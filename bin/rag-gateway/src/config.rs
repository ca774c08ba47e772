//! Gateway configuration, loaded from environment variables at startup.

/// Deployed backend the gateway fronts when `RAG_GATEWAY_UPSTREAM` is unset.
pub const DEFAULT_UPSTREAM: &str =
    "https://bpve3nbtfqav4lskuxeeperrzq0qdgki.lambda-url.us-east-1.on.aws";

/// Runtime configuration for rag-gateway.
///
/// Every field has a default so the gateway starts without any environment
/// variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Base address requests are forwarded to, without a trailing `/`.
    pub upstream_url: String,

    /// Path prefix stripped before forwarding (default: `"/api"`).
    /// Normalised to a leading `/` and no trailing `/`; empty proxies
    /// every path except `/health`.
    pub path_prefix: String,

    /// Upper bound for one upstream exchange, in seconds.
    pub upstream_timeout_secs: u64,

    /// Largest request body accepted for forwarding.
    pub max_body_bytes: usize,

    /// `tracing` filter string, e.g. `"info"` or `"debug,hyper=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("RAG_GATEWAY_BIND", "0.0.0.0:3000"),
            upstream_url: env_or("RAG_GATEWAY_UPSTREAM", DEFAULT_UPSTREAM)
                .trim_end_matches('/')
                .to_owned(),
            path_prefix: normalize_prefix(&env_or("RAG_GATEWAY_PREFIX", "/api")),
            upstream_timeout_secs: parse_env("RAG_GATEWAY_TIMEOUT_SECS", 60),
            max_body_bytes: parse_env("RAG_GATEWAY_MAX_BODY_BYTES", 10 * 1024 * 1024),
            log_level: env_or("RAG_LOG", "info"),
            log_json: std::env::var("RAG_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// `"api/"` -> `"/api"`, `"/"` -> `""`.
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
