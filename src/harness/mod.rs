//! Run orchestration.
//!
//! `Launch → Navigate → AwaitReady → Evaluate → CollectDiagnostics →
//! Classify`. Diagnostics are collected on both the success and the
//! failure edge, and the session is closed on every path once it exists.

pub mod classify;
pub mod diagnostics;
pub mod report;
pub mod types;
pub mod waiter;

use std::future::Future;
use tracing::{info, warn};

use crate::browser::{BrowserSession, ChromeSession, SessionResult};
use crate::config::RunConfig;

pub use classify::{classify, payload_ok};
pub use report::{exit_code, print_outcome, write_report};
pub use types::{
    Diagnostics, Evidence, HarnessError, HarnessResult, RunResult, RunResultBuilder, RunStatus,
    Verdict,
};

/// Run against a real Chrome/Chromium launched from `config`
pub async fn run(config: &RunConfig) -> RunResult {
    run_with_launcher(config, || ChromeSession::launch(config)).await
}

/// Acquire a session with `launch`, run it, and release it.
///
/// A launch failure becomes the run's primary error; there is then no
/// page to collect diagnostics from.
pub async fn run_with_launcher<S, F, Fut>(config: &RunConfig, launch: F) -> RunResult
where
    S: BrowserSession,
    F: FnOnce() -> Fut,
    Fut: Future<Output = SessionResult<S>>,
{
    match launch().await {
        Ok(mut session) => run_session(&mut session, config).await,
        Err(err) => {
            warn!(error = %err, "browser session unavailable");
            RunResultBuilder::new(config)
                .error(HarnessError::from(err).to_string())
                .freeze(&config.markers)
        }
    }
}

/// Drive an already-open session through the pipeline, then close it
pub async fn run_session<S>(session: &mut S, config: &RunConfig) -> RunResult
where
    S: BrowserSession + ?Sized,
{
    let mut builder = RunResultBuilder::new(config);

    match waiter::await_payload(session, config).await {
        Ok(payload) => {
            if let Err(err) = session.screenshot(&config.screenshot_path).await {
                warn!(error = %err, "screenshot after payload failed");
            }
            builder = builder.payload(payload);
        }
        Err(err) => {
            warn!(error = %err, "no payload obtained");
            builder = builder.error(err.to_string());
        }
    }

    let diagnostics = diagnostics::collect(session, &config.screenshot_path).await;
    builder = builder
        .diagnostics(diagnostics)
        .console_lines(session.console().snapshot());

    if let Err(err) = session.close().await {
        warn!(error = %err, "browser session did not close cleanly");
    }

    let result = builder.freeze(&config.markers);
    info!(status = %result.status, ok = result.ok, "run classified");
    result
}
