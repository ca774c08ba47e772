//! Query submission flow.
//!
//! ```text
//! Idle -> Submitting -> { Navigated | Failed }
//! ```
//!
//! The state lives in a `watch` channel so a front end can show a busy
//! indicator and disable its input while the request is in flight.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::QueryApi;
use crate::error::{ErrorKind, QueryError};
use crate::identity::IdentityProvider;
use crate::models::Query;

/// Submitted instead of empty input; submission is never blocked.
pub const PLACEHOLDER_QUESTION: &str = "How do I increase neuroplasticity?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    /// The job exists; the caller should open the viewer for `query_id`.
    Navigated { query_id: String },
    /// Editable again, with the error to show.
    Failed { kind: ErrorKind, message: String },
}

impl SubmitState {
    pub fn input_enabled(&self) -> bool {
        !matches!(self, SubmitState::Submitting)
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("a submission is already in flight")]
    AlreadySubmitting,

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// The text actually sent for a given user input.
pub fn effective_query_text(input: &str) -> &str {
    if input.trim().is_empty() {
        PLACEHOLDER_QUESTION
    } else {
        input
    }
}

pub struct SubmissionFlow<A, I> {
    api: Arc<A>,
    identity: Arc<I>,
    state: watch::Sender<SubmitState>,
}

impl<A: QueryApi, I: IdentityProvider> SubmissionFlow<A, I> {
    pub fn new(api: Arc<A>, identity: Arc<I>) -> Self {
        let (state, _) = watch::channel(SubmitState::Idle);
        Self { api, identity, state }
    }

    pub fn state(&self) -> SubmitState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmitState> {
        self.state.subscribe()
    }

    pub fn input_enabled(&self) -> bool {
        self.state.borrow().input_enabled()
    }

    /// Submit `input` (or the placeholder when it is blank).
    ///
    /// Dropping the returned future mid-flight puts the flow back to `Idle`.
    pub async fn submit(&self, input: &str) -> Result<Query, FlowError> {
        let started = self.state.send_if_modified(|s| {
            if matches!(s, SubmitState::Submitting) {
                return false;
            }
            *s = SubmitState::Submitting;
            true
        });
        if !started {
            return Err(FlowError::AlreadySubmitting);
        }
        let mut guard = InFlight {
            state: &self.state,
            armed: true,
        };

        let user_id = self.identity.session_id();
        let query_text = effective_query_text(input);
        info!(%user_id, query_text, "submitting query");

        let result = self.api.submit_query(query_text, &user_id).await;
        guard.armed = false;

        match result {
            Ok(query) => {
                info!(query_id = %query.query_id, "query accepted");
                self.state.send_replace(SubmitState::Navigated {
                    query_id: query.query_id.clone(),
                });
                Ok(query)
            }
            Err(e) => {
                warn!(error = %e, "query submission failed");
                self.state.send_replace(SubmitState::Failed {
                    kind: e.kind(),
                    message: e.user_message(),
                });
                Err(e.into())
            }
        }
    }
}

/// Resets the flow to `Idle` if a submission is abandoned mid-flight.
struct InFlight<'a> {
    state: &'a watch::Sender<SubmitState>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_replace(SubmitState::Idle);
        }
    }
}
