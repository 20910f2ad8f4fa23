use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::browser::SessionError;
use crate::config::{EnvironmentMarkers, RunConfig};

/// Harness-level outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The application reported success
    Pass,
    /// The application failed, or the run never reached a payload
    Fail,
    /// The environment lacks a capability the page needs
    Inconclusive,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pass => write!(f, "pass"),
            RunStatus::Fail => write!(f, "fail"),
            RunStatus::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

/// Best-effort evidence captured at the end of every run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Visible page text, truncated
    pub body_text: String,
    /// Most recent console lines, oldest first
    pub console_tail: Vec<String>,
}

/// The persisted report of a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// RFC 3339 UTC time at which the result was frozen
    pub timestamp_utc: String,

    /// Target URL
    pub url: String,

    /// Readiness timeout in milliseconds
    pub timeout_ms: u64,

    /// Whether the browser ran headless
    pub headless: bool,

    /// Browser launch arguments
    pub launch_args: Vec<String>,

    /// Final classification
    pub status: RunStatus,

    /// True only when a payload was obtained with `ok: true`
    pub ok: bool,

    /// Application result object, `null` when none was obtained
    pub payload: Option<Value>,

    /// Screenshot artifact path
    pub screenshot: PathBuf,

    /// Primary error, empty when none.
    ///
    /// Only failures that prevent a payload land here. A failed screenshot
    /// after a payload was read is logged and leaves this empty, so such a
    /// run still passes on its payload alone.
    pub error: String,

    /// Supplementary evidence
    pub diagnostics: Diagnostics,
}

/// Outcome of classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: RunStatus,
    pub ok: bool,
    pub error: String,
}

/// Everything the classifier looks at
#[derive(Debug, Clone, Copy)]
pub struct Evidence<'a> {
    pub payload: Option<&'a Value>,
    pub error: Option<&'a str>,
    pub body_text: &'a str,
    /// Every console line observed, not just the reported tail
    pub console_lines: &'a [String],
}

/// Accumulates a run's evidence phase by phase; frozen into a
/// [`RunResult`] only once classification happens.
#[derive(Debug, Clone)]
pub struct RunResultBuilder {
    url: String,
    timeout_ms: u64,
    headless: bool,
    launch_args: Vec<String>,
    screenshot: PathBuf,
    payload: Option<Value>,
    error: Option<String>,
    diagnostics: Diagnostics,
    console_lines: Vec<String>,
}

impl RunResultBuilder {
    /// Start from the echoed configuration with no evidence
    pub fn new(config: &RunConfig) -> Self {
        Self {
            url: config.url.clone(),
            timeout_ms: config.timeout_ms(),
            headless: config.headless,
            launch_args: config.launch_args.clone(),
            screenshot: config.screenshot_path.clone(),
            payload: None,
            error: None,
            diagnostics: Diagnostics::default(),
            console_lines: Vec::new(),
        }
    }

    /// Record the application payload; `None` and JSON `null` both mean absent
    pub fn payload(mut self, payload: Option<Value>) -> Self {
        self.payload = payload.filter(|p| !p.is_null());
        self
    }

    /// Record the primary error. Later errors never replace the first one.
    pub fn error(mut self, error: impl Into<String>) -> Self {
        if self.error.is_none() {
            let error = error.into();
            if !error.is_empty() {
                self.error = Some(error);
            }
        }
        self
    }

    /// Record the captured diagnostics
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Record the full console log used for marker matching
    pub fn console_lines(mut self, lines: Vec<String>) -> Self {
        self.console_lines = lines;
        self
    }

    /// Whether a primary error has been recorded
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Classify the accumulated evidence and freeze the result
    pub fn freeze(self, markers: &EnvironmentMarkers) -> RunResult {
        let verdict = super::classify::classify(
            &Evidence {
                payload: self.payload.as_ref(),
                error: self.error.as_deref(),
                body_text: &self.diagnostics.body_text,
                console_lines: &self.console_lines,
            },
            markers,
        );

        RunResult {
            timestamp_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            url: self.url,
            timeout_ms: self.timeout_ms,
            headless: self.headless,
            launch_args: self.launch_args,
            status: verdict.status,
            ok: verdict.ok,
            payload: self.payload,
            screenshot: self.screenshot,
            error: verdict.error,
            diagnostics: self.diagnostics,
        }
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error types for harness operations
#[derive(Debug)]
pub enum HarnessError {
    /// Error raised by the browser session
    Session(SessionError),

    /// A bounded phase did not finish in time
    Timeout {
        phase: &'static str,
        after: Duration,
        last_error: Option<String>,
    },

    /// I/O error while writing the report
    Io(std::io::Error),

    /// Report serialization error
    Serialization(serde_json::Error),
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessError::Session(err) => write!(f, "{}", err),
            HarnessError::Timeout {
                phase,
                after,
                last_error,
            } => {
                write!(
                    f,
                    "Timeout {}ms exceeded while waiting for {}",
                    after.as_millis(),
                    phase
                )?;
                if let Some(last) = last_error {
                    write!(f, " (last error: {})", last)?;
                }
                Ok(())
            }
            HarnessError::Io(err) => write!(f, "I/O error: {}", err),
            HarnessError::Serialization(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Session(err) => Some(err),
            HarnessError::Timeout { .. } => None,
            HarnessError::Io(err) => Some(err),
            HarnessError::Serialization(err) => Some(err),
        }
    }
}

impl From<SessionError> for HarnessError {
    fn from(err: SessionError) -> Self {
        HarnessError::Session(err)
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::Io(err)
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::Serialization(err)
    }
}
