//! HTTP middleware stack.
//!
//! - [`cors`]: unconditional permissive CORS headers on every response.
//! - [`trace`]: per-request span with trace id and latency.

pub mod cors;
pub mod trace;
