use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rag_query_client::viewer::render;
use rag_query_client::{
    poller, ApiClient, ApiConfig, FileIdentity, IdentityProvider, PollOutcome,
    PollPolicy, QueryViewer, SubmissionFlow, SubmitState, ViewState,
};
use tracing::debug;

use crate::cli::{Cli, Command};

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ApiConfig::from_env(cli.base_url.as_deref())
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    debug!(base_url = %config.base_url, "resolved API address");

    match cli.command {
        Command::Session { reset } => {
            let identity = FileIdentity::from_env(cli.identity_file);
            if reset {
                identity.clear().context("failed to reset the session identity")?;
            }
            println!("{}", identity.session_id());
            Ok(ExitCode::SUCCESS)
        }
        Command::Ask { text, watch } => {
            let api = Arc::new(ApiClient::new(config)?);
            let identity = Arc::new(FileIdentity::from_env(cli.identity_file));
            let Some(query_id) = ask(api.clone(), identity, &text.join(" ")).await else {
                return Ok(ExitCode::FAILURE);
            };
            let viewer = Arc::new(QueryViewer::new(api, query_id));
            if watch {
                Ok(watch_query(viewer, PollPolicy::default()).await)
            } else {
                Ok(view_once(&viewer).await)
            }
        }
        Command::View { query_id } => {
            let viewer = QueryViewer::new(Arc::new(ApiClient::new(config)?), query_id);
            Ok(view_once(&viewer).await)
        }
        Command::Watch {
            query_id,
            interval_secs,
            max_interval_secs,
            max_attempts,
        } => {
            let viewer = Arc::new(QueryViewer::new(Arc::new(ApiClient::new(config)?), query_id));
            let policy = PollPolicy {
                initial_delay: Duration::from_secs(interval_secs),
                max_delay: Duration::from_secs(max_interval_secs.max(interval_secs)),
                max_attempts: max_attempts.max(1),
            };
            Ok(watch_query(viewer, policy).await)
        }
    }
}

/// Run the submission flow; prints progress and returns the new query id.
async fn ask(
    api: Arc<ApiClient>,
    identity: Arc<FileIdentity>,
    text: &str,
) -> Option<String> {
    let flow = SubmissionFlow::new(api, identity);
    let mut states = flow.subscribe();

    let submit = flow.submit(text);
    tokio::pin!(submit);
    let result = loop {
        tokio::select! {
            result = &mut submit => break result,
            changed = states.changed() => {
                if changed.is_err() {
                    break (&mut submit).await;
                }
                if *states.borrow_and_update() == SubmitState::Submitting {
                    eprintln!("Submitting...");
                }
            }
        }
    };

    match result {
        Ok(query) => {
            eprintln!("Query submitted: {}", query.query_id);
            Some(query.query_id)
        }
        Err(e) => {
            match flow.state() {
                SubmitState::Failed { message, .. } => eprintln!("error: {message}"),
                _ => eprintln!("error: {e}"),
            }
            None
        }
    }
}

async fn view_once(viewer: &QueryViewer<ApiClient>) -> ExitCode {
    let view = viewer.refresh().await;
    print!("{}", viewer.render());
    exit_code(&view)
}

async fn watch_query(viewer: Arc<QueryViewer<ApiClient>>, policy: PollPolicy) -> ExitCode {
    let handle = poller::spawn(viewer.clone(), policy);
    let mut views = handle.views();
    let finished = handle.finished();
    tokio::pin!(finished);

    let mut printed: Option<ViewState> = None;
    let mut open = true;
    let outcome = loop {
        tokio::select! {
            outcome = &mut finished => break outcome,
            changed = views.changed(), if open => {
                if changed.is_err() {
                    open = false;
                    continue;
                }
                let view = views.borrow_and_update().clone();
                println!("{}", render(viewer.query_id(), &view));
                printed = Some(view);
            }
            _ = tokio::signal::ctrl_c() => break PollOutcome::Cancelled,
        }
    };

    // The last published view may not have been printed yet.
    let last = views.borrow().clone();
    if printed.as_ref() != Some(&last) {
        println!("{}", render(viewer.query_id(), &last));
    }

    match outcome {
        PollOutcome::Complete => ExitCode::SUCCESS,
        PollOutcome::Exhausted => {
            eprintln!("Still processing; try `rag-cli view {}` later.", viewer.query_id());
            ExitCode::SUCCESS
        }
        PollOutcome::NotFound | PollOutcome::Cancelled => exit_code(&last),
    }
}

fn exit_code(view: &ViewState) -> ExitCode {
    match view {
        ViewState::Error(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
