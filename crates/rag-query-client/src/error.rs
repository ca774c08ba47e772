use std::path::PathBuf;

use thiserror::Error;

/// Failures of the backend operations.
///
/// The client never retries; callers decide what to do with each kind.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The network call could not complete (connect failure, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status or an unusable body.
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// The backend does not know the requested query id.
    #[error("query not found: {0}")]
    NotFound(String),
}

/// Copyable discriminant of [`QueryError`], kept by views after the error
/// value itself is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Server,
    NotFound,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Transport(_) => ErrorKind::Transport,
            QueryError::Server { .. } => ErrorKind::Server,
            QueryError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::NotFound(id) => format!("Query {id} was not found."),
            QueryError::Transport(_) => {
                "Could not reach the query service. Please try again later.".to_owned()
            }
            QueryError::Server { .. } => "Failed to fetch data. Please try again later.".to_owned(),
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return QueryError::Transport(format!("request timed out: {e}"));
        }
        // Keep the innermost cause; reqwest's own Display is often just
        // "error sending request".
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            message = format!("{message}: {inner}");
            source = inner.source();
        }
        QueryError::Transport(message)
    }
}

/// Failures of the persisted session identity.
///
/// These never reach the user: the provider degrades to an ephemeral id.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no local storage location is available")]
    Unavailable,

    #[error("identity storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
