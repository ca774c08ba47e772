//! rag-query-client
//!
//! Client side of the asynchronous query lifecycle:
//!
//! - [`api`]: typed contract for the backend's `submitQuery` / `getQuery`
//!   operations ([`QueryApi`], [`ApiClient`]).
//! - [`identity`]: stable per-client session identifier.
//! - [`flow`]: the submission state machine (`Idle -> Submitting -> ...`).
//! - [`viewer`]: fetch-by-id snapshots rendered as one of three states.
//! - [`poller`]: optional bounded auto-refresh on top of the viewer.

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod identity;
pub mod models;
pub mod poller;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, QueryApi};
pub use config::ApiConfig;
pub use error::{ErrorKind, IdentityError, QueryError};
pub use flow::{FlowError, SubmissionFlow, SubmitState, PLACEHOLDER_QUESTION};
pub use identity::{EphemeralIdentity, FileIdentity, IdentityProvider};
pub use models::{Query, SubmitQueryRequest};
pub use poller::{PollHandle, PollOutcome, PollPolicy};
pub use viewer::{Block, QueryViewer, RenderedView, SourceRef, ViewError, ViewState};
