//! Report persistence and exit code mapping.
//!
//! The `error` field of a report names the failure that kept the run from
//! reading a payload. Screenshot failures never appear there: after a
//! payload they are logged, and during diagnostics they are swallowed.

use std::fs;
use std::path::Path;
use tracing::info;

use super::types::{HarnessResult, RunResult, RunStatus};

/// Exit code for a run that passed or could not be tested
pub const EXIT_OK: u8 = 0;

/// Exit code for a failed run
pub const EXIT_FAIL: u8 = 2;

/// Write the result as pretty-printed JSON, replacing any previous report.
///
/// Errors here are fatal for the run: there is no fallback location.
pub fn write_report(result: &RunResult, path: &Path) -> HarnessResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json)?;
    info!(path = %path.display(), status = %result.status, "report written");
    Ok(())
}

/// Read a previously written report
pub fn read_report(path: &Path) -> HarnessResult<RunResult> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Process exit code for a final status
pub fn exit_code(status: RunStatus) -> u8 {
    match status {
        RunStatus::Pass | RunStatus::Inconclusive => EXIT_OK,
        RunStatus::Fail => EXIT_FAIL,
    }
}

/// One line for the operator, naming the report location
pub fn summary_line(status: RunStatus, report_path: &Path) -> String {
    match status {
        RunStatus::Pass => format!("Browser QA passed. Report: {}", report_path.display()),
        RunStatus::Inconclusive => format!(
            "Browser QA inconclusive (environment limitation). Report: {}",
            report_path.display()
        ),
        RunStatus::Fail => format!("Browser QA failed. Report: {}", report_path.display()),
    }
}

/// Print the outcome: stdout for a pass, stderr otherwise, and the
/// recorded error after a failure
pub fn print_outcome(result: &RunResult, report_path: &Path) {
    let line = summary_line(result.status, report_path);
    match result.status {
        RunStatus::Pass => println!("{}", line),
        RunStatus::Inconclusive => eprintln!("{}", line),
        RunStatus::Fail => {
            eprintln!("{}", line);
            if !result.error.is_empty() {
                eprintln!("{}", result.error);
            }
        }
    }
}
