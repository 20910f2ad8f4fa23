//! Browser session abstraction.
//!
//! The harness never talks to a browser directly. It drives a
//! [`BrowserSession`], which is implemented by:
//! - `ChromeSession` for a real Chrome/Chromium over the DevTools Protocol
//! - `MockSession` for scripted, in-process runs (tests and demos)

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::console::ConsoleLog;
use super::types::SessionResult;

/// Expression returning the trimmed visible text of the page (empty without a body)
pub const BODY_TEXT_EXPRESSION: &str = "(document.body?.innerText || \"\").trim()";

/// Capability interface over one browser instance with one open page
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate the page and wait for the DOM to load
    async fn navigate(&mut self, url: &str) -> SessionResult<()>;

    /// Evaluate an expression in the page and return its JSON value
    /// (`Value::Null` for `null`/`undefined`)
    async fn evaluate(&mut self, expression: &str) -> SessionResult<Value>;

    /// Write a viewport-only PNG screenshot to `path`, overwriting it
    async fn screenshot(&mut self, path: &Path) -> SessionResult<()>;

    /// Console lines observed since the page opened
    fn console(&self) -> &ConsoleLog;

    /// Release the page and the browser
    async fn close(&mut self) -> SessionResult<()>;

    /// Trimmed visible page text
    async fn body_text(&mut self) -> SessionResult<String> {
        let value = self.evaluate(BODY_TEXT_EXPRESSION).await?;
        Ok(match value {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

/// Create the parent directory of an artifact path
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
