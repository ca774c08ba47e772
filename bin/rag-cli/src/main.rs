//! rag-cli – terminal front end for the query lifecycle.
//!
//! `ask` submits and shows the result view, `view` fetches once, `watch`
//! keeps refreshing, `session` shows or resets the session identity.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout only carries the rendered view.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cli.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: --log-level '{}' is not a valid tracing filter ({}); \
                     falling back to 'warn'",
                    cli.log_level, e
                );
                tracing_subscriber::EnvFilter::new("warn")
            }
        },
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    commands::run(cli).await
}
