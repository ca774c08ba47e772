//! Query status viewer.
//!
//! A [`QueryViewer`] holds the latest snapshot of one query and renders it
//! as exactly one of `Loading`, `Error` or `Result`. Every refresh is
//! stamped with a client-side counter; a result only replaces the held
//! view when its stamp is newer than the one already applied, so a slow
//! early response can never overwrite a fast later one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::api::QueryApi;
use crate::error::{ErrorKind, QueryError};
use crate::models::Query;

pub const PROCESSING_MESSAGE: &str = "Still loading. Please try again later.";
pub const LOADING_MESSAGE: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&QueryError> for ViewError {
    fn from(e: &QueryError) -> Self {
        Self {
            kind: e.kind(),
            message: e.user_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Error(ViewError),
    Result(Query),
}

/// Stamp handed out when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

struct Applied {
    ticket: u64,
    view: ViewState,
}

pub struct QueryViewer<A> {
    api: Arc<A>,
    query_id: String,
    issued: AtomicU64,
    current: Mutex<Applied>,
}

impl<A: QueryApi> QueryViewer<A> {
    pub fn new(api: Arc<A>, query_id: impl Into<String>) -> Self {
        Self {
            api,
            query_id: query_id.into(),
            issued: AtomicU64::new(0),
            current: Mutex::new(Applied {
                ticket: 0,
                view: ViewState::Loading,
            }),
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn view(&self) -> ViewState {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .view
            .clone()
    }

    pub fn render(&self) -> RenderedView {
        render(&self.query_id, &self.view())
    }

    /// Fetch once and return the view that is current afterwards.
    pub async fn refresh(&self) -> ViewState {
        let ticket = self.begin();
        let result = self.api.get_query(&self.query_id).await;
        self.apply(ticket, result);
        self.view()
    }

    /// Stamp a new fetch.
    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Apply the outcome of the fetch stamped `ticket`.
    ///
    /// Returns `false` when the outcome was discarded as stale.
    pub fn apply(&self, ticket: Ticket, result: Result<Query, QueryError>) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket.0 <= current.ticket {
            debug!(query_id = %self.query_id, ticket = ticket.0, applied = current.ticket, "discarding stale response");
            return false;
        }
        current.ticket = ticket.0;

        let next = match result {
            Ok(query) => ViewState::Result(query),
            Err(e) => ViewState::Error(ViewError::from(&e)),
        };

        // Completion is monotonic on the backend; never show it regress.
        if let (ViewState::Result(held), ViewState::Result(incoming)) = (&current.view, &next) {
            if held.is_complete && !incoming.is_complete && held.query_id == incoming.query_id {
                debug!(query_id = %self.query_id, "ignoring incomplete snapshot after completion");
                return false;
            }
        }

        current.view = next;
        true
    }
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub label: String,
    pub href: String,
}

impl SourceRef {
    fn new(source: &str) -> Self {
        Self {
            label: source.to_owned(),
            href: format!("/source/{source}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Placeholder,
    ErrorMessage(String),
    Question(String),
    Processing,
    Answer(String),
    Source(SourceRef),
}

/// Output of [`render`]: a title line plus typed content blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub query_id: String,
    pub blocks: Vec<Block>,
}

impl RenderedView {
    pub fn sources(&self) -> impl Iterator<Item = &SourceRef> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Source(s) => Some(s),
            _ => None,
        })
    }

    pub fn answer(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::Answer(a) => Some(a.as_str()),
            _ => None,
        })
    }

    pub fn is_processing(&self) -> bool {
        self.blocks.contains(&Block::Processing)
    }

    pub fn error(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::ErrorMessage(m) => Some(m.as_str()),
            _ => None,
        })
    }
}

/// Render one view state. Pure; never fails.
pub fn render(query_id: &str, view: &ViewState) -> RenderedView {
    let blocks = match view {
        ViewState::Loading => vec![Block::Placeholder],
        ViewState::Error(e) => vec![Block::ErrorMessage(e.message.clone())],
        ViewState::Result(query) => {
            let mut blocks = vec![Block::Question(query.query_text.clone())];
            if query.is_complete {
                blocks.push(Block::Answer(
                    query.answer_text.clone().unwrap_or_default(),
                ));
                blocks.extend(query.sources.iter().map(|s| Block::Source(SourceRef::new(s))));
            } else {
                blocks.push(Block::Processing);
            }
            blocks
        }
    };

    RenderedView {
        query_id: query_id.to_owned(),
        blocks,
    }
}

impl fmt::Display for RenderedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "View Query")?;
        writeln!(f, "Query ID: {}", self.query_id)?;
        writeln!(f)?;

        let mut in_sources = false;
        for block in &self.blocks {
            match block {
                Block::Placeholder => writeln!(f, "{LOADING_MESSAGE}")?,
                Block::ErrorMessage(m) => writeln!(f, "error: {m}")?,
                Block::Question(q) => {
                    writeln!(f, "Question")?;
                    writeln!(f, "  {q}")?;
                }
                Block::Processing => writeln!(f, "[..] {PROCESSING_MESSAGE}")?,
                Block::Answer(a) => {
                    writeln!(f, "Response")?;
                    for line in a.lines() {
                        writeln!(f, "  {line}")?;
                    }
                }
                Block::Source(s) => {
                    if !in_sources {
                        writeln!(f)?;
                        writeln!(f, "Sources")?;
                        in_sources = true;
                    }
                    writeln!(f, "  -> {} ({})", s.label, s.href)?;
                }
            }
        }
        Ok(())
    }
}
