//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rag-cli", version, about = "Ask the RAG backend a question and read the answer")]
pub struct Cli {
    /// API base address; overrides RAG_API_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Where the session identity is kept; overrides RAG_IDENTITY_FILE.
    #[arg(long, global = true)]
    pub identity_file: Option<PathBuf>,

    /// tracing filter for diagnostics on stderr (RUST_LOG wins when set).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a question. Empty input submits the example question.
    Ask {
        /// Question text; words are joined with spaces.
        text: Vec<String>,

        /// Keep refreshing the result instead of showing it once.
        #[arg(long)]
        watch: bool,
    },

    /// Fetch a query once and show its current state.
    View { query_id: String },

    /// Re-fetch a query with backoff until it completes.
    ///
    /// Auto-refresh is an addition; `view` shows a single snapshot.
    Watch {
        query_id: String,

        /// Delay before the second fetch; doubles after each pending answer.
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,

        /// Upper bound for the delay between fetches.
        #[arg(long, default_value_t = 30)]
        max_interval_secs: u64,

        /// Give up after this many fetches.
        #[arg(long, default_value_t = 20)]
        max_attempts: u32,
    },

    /// Print the session identity used to scope submitted queries.
    Session {
        /// Forget the stored identity and create a new one.
        #[arg(long)]
        reset: bool,
    },
}
