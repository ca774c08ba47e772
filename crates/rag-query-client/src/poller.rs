//! Bounded auto-refresh for a [`QueryViewer`].
//!
//! This is an addition on top of the single fetch-on-open viewer: it keeps
//! re-fetching with exponential backoff until the query completes, is not
//! found, or the attempt budget runs out. Each new view is published on a
//! `watch` channel. Dropping the [`PollHandle`] aborts the background task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::QueryApi;
use crate::error::ErrorKind;
use crate::viewer::{QueryViewer, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            max_attempts: 20,
        }
    }
}

impl PollPolicy {
    /// Delay after the fetch numbered `attempt` (0-based): doubles each time,
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Complete,
    NotFound,
    Exhausted,
    Cancelled,
}

pub struct PollHandle {
    views: watch::Receiver<ViewState>,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn views(&self) -> watch::Receiver<ViewState> {
        self.views.clone()
    }

    /// Wait for the poller to stop on its own.
    pub async fn finished(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start polling `viewer` in the background.
pub fn spawn<A>(viewer: Arc<QueryViewer<A>>, policy: PollPolicy) -> PollHandle
where
    A: QueryApi + 'static,
{
    let (tx, views) = watch::channel(viewer.view());
    let task = tokio::spawn(run(viewer, policy, tx));
    PollHandle {
        views,
        task: Some(task),
    }
}

async fn run<A: QueryApi>(
    viewer: Arc<QueryViewer<A>>,
    policy: PollPolicy,
    tx: watch::Sender<ViewState>,
) -> PollOutcome {
    for attempt in 0..policy.max_attempts {
        let view = viewer.refresh().await;
        tx.send_replace(view.clone());

        match &view {
            ViewState::Result(q) if q.is_complete => {
                info!(query_id = %viewer.query_id(), attempt, "query complete");
                return PollOutcome::Complete;
            }
            ViewState::Error(e) if e.kind == ErrorKind::NotFound => {
                info!(query_id = %viewer.query_id(), "query not found; stop polling");
                return PollOutcome::NotFound;
            }
            _ => {}
        }

        if attempt + 1 < policy.max_attempts {
            let delay = policy.delay_for(attempt);
            debug!(query_id = %viewer.query_id(), attempt, ?delay, "query pending; backing off");
            tokio::time::sleep(delay).await;
        }
    }
    PollOutcome::Exhausted
}
