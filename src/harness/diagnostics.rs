//! End-of-run evidence capture.
//!
//! Runs after every wait, successful or not. Each step is independent:
//! a failing step leaves its field at the default and the next one runs.

use std::path::Path;
use tracing::debug;

use super::types::Diagnostics;
use crate::browser::{BrowserSession, SessionResult};
use crate::config::{MAX_BODY_TEXT_CHARS, MAX_CONSOLE_TAIL};

/// One best-effort diagnostic capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticStep {
    /// Visible page text, truncated
    BodyText,
    /// Trailing window of console lines
    ConsoleTail,
    /// Viewport screenshot, replacing any earlier one
    Screenshot,
}

impl DiagnosticStep {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticStep::BodyText => "body_text",
            DiagnosticStep::ConsoleTail => "console_tail",
            DiagnosticStep::Screenshot => "screenshot",
        }
    }
}

/// Steps in execution order
pub const DIAGNOSTIC_STEPS: [DiagnosticStep; 3] = [
    DiagnosticStep::BodyText,
    DiagnosticStep::ConsoleTail,
    DiagnosticStep::Screenshot,
];

/// Run every diagnostic step, swallowing individual failures
pub async fn collect<S>(session: &mut S, screenshot_path: &Path) -> Diagnostics
where
    S: BrowserSession + ?Sized,
{
    let mut diagnostics = Diagnostics::default();
    for step in DIAGNOSTIC_STEPS {
        if let Err(err) = run_step(step, session, screenshot_path, &mut diagnostics).await {
            debug!(step = step.name(), error = %err, "diagnostic step skipped");
        }
    }
    diagnostics
}

async fn run_step<S>(
    step: DiagnosticStep,
    session: &mut S,
    screenshot_path: &Path,
    diagnostics: &mut Diagnostics,
) -> SessionResult<()>
where
    S: BrowserSession + ?Sized,
{
    match step {
        DiagnosticStep::BodyText => {
            let text = session.body_text().await?;
            diagnostics.body_text = truncate_chars(&text, MAX_BODY_TEXT_CHARS);
        }
        DiagnosticStep::ConsoleTail => {
            diagnostics.console_tail = session.console().tail(MAX_CONSOLE_TAIL);
        }
        DiagnosticStep::Screenshot => {
            session.screenshot(screenshot_path).await?;
        }
    }
    Ok(())
}

/// First `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
