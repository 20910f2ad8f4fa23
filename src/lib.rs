//! Browser QA - headless browser harness for a single page check.
//!
//! This crate provides:
//! - A browser session abstraction with a Chrome (DevTools Protocol) backend
//!   and a scripted mock backend for testing
//! - Readiness polling against an application-defined signal
//! - Best-effort diagnostics (page text, console tail, screenshot) on every run
//! - Pass / fail / inconclusive classification and a JSON report
//!
//! # Example
//!
//! ```rust,no_run
//! use browser_qa::{RunConfig, harness};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::from_env();
//! let result = harness::run(&config).await;
//! harness::write_report(&result, &config.report_path)?;
//! std::process::exit(harness::exit_code(result.status) as i32);
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod harness;

// Re-export configuration
pub use config::{EnvironmentMarkers, RunConfig};

// Re-export browser session types
pub use browser::{BrowserSession, ChromeSession, ConsoleLog, MockSession, SessionError, SessionResult};

// Re-export harness types
pub use harness::{
    Diagnostics, HarnessError, HarnessResult, RunResult, RunResultBuilder, RunStatus, exit_code,
    run, run_session, run_with_launcher, write_report,
};
