//! Scripted in-process browser session.
//!
//! `MockSession` plays back a fixed script instead of driving a browser:
//! - readiness turns true after a number of polls (or never)
//! - the payload expression yields a fixed JSON value (or an error)
//! - console lines are emitted when navigation happens
//! - any step can be made to fail
//!
//! Screenshots are real PNG files rendered with `image`, so artifact
//! handling can be exercised end to end.

use async_trait::async_trait;
use image::{ImageBuffer, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

use super::backend::{BODY_TEXT_EXPRESSION, BrowserSession, ensure_parent_dir};
use super::console::ConsoleLog;
use super::types::{SessionError, SessionResult};
use crate::config::{DEFAULT_PAYLOAD_EXPRESSION, DEFAULT_READY_EXPRESSION};

/// Scripted browser session for tests and demos
#[derive(Debug, Clone)]
pub struct MockSession {
    ready_expression: String,
    payload_expression: String,
    /// Readiness turns true on poll number `n + 1`; `None` never turns true
    ready_after: Option<usize>,
    payload: Value,
    payload_error: Option<String>,
    navigation_error: Option<String>,
    body_text: Option<String>,
    body_error: Option<String>,
    screenshot_error: Option<String>,
    scripted_console: Vec<String>,
    fill: [u8; 3],
    width: u32,
    height: u32,
    console: ConsoleLog,
    // Observed behaviour
    navigated_to: Option<String>,
    polls: usize,
    screenshots: usize,
    closed: bool,
}

impl MockSession {
    /// A session that is ready on the first poll with a `null` payload
    pub fn new() -> Self {
        Self {
            ready_expression: DEFAULT_READY_EXPRESSION.to_string(),
            payload_expression: DEFAULT_PAYLOAD_EXPRESSION.to_string(),
            ready_after: Some(0),
            payload: Value::Null,
            payload_error: None,
            navigation_error: None,
            body_text: Some(String::new()),
            body_error: None,
            screenshot_error: None,
            scripted_console: Vec::new(),
            fill: [32, 32, 32],
            width: 320,
            height: 240,
            console: ConsoleLog::new(),
            navigated_to: None,
            polls: 0,
            screenshots: 0,
            closed: false,
        }
    }

    /// Answer to these expressions instead of the defaults
    pub fn with_expressions(mut self, ready: impl Into<String>, payload: impl Into<String>) -> Self {
        self.ready_expression = ready.into();
        self.payload_expression = payload.into();
        self
    }

    /// Report ready after `polls` negative polls
    pub fn ready_after(mut self, polls: usize) -> Self {
        self.ready_after = Some(polls);
        self
    }

    /// Never report ready
    pub fn never_ready(mut self) -> Self {
        self.ready_after = None;
        self
    }

    /// Value returned by the payload expression
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Make payload evaluation fail
    pub fn fail_payload(mut self, message: impl Into<String>) -> Self {
        self.payload_error = Some(message.into());
        self
    }

    /// Make navigation fail
    pub fn fail_navigation(mut self, message: impl Into<String>) -> Self {
        self.navigation_error = Some(message.into());
        self
    }

    /// Visible text of the loaded page
    pub fn page_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = Some(text.into());
        self
    }

    /// The page has no document body
    pub fn without_document(mut self) -> Self {
        self.body_text = None;
        self
    }

    /// Make body text extraction fail
    pub fn fail_body_text(mut self, message: impl Into<String>) -> Self {
        self.body_error = Some(message.into());
        self
    }

    /// Make screenshots fail
    pub fn fail_screenshot(mut self, message: impl Into<String>) -> Self {
        self.screenshot_error = Some(message.into());
        self
    }

    /// Console lines emitted once navigation starts
    pub fn console_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripted_console.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Screenshot dimensions and fill color
    pub fn viewport(mut self, width: u32, height: u32, fill: [u8; 3]) -> Self {
        self.width = width;
        self.height = height;
        self.fill = fill;
        self
    }

    /// URL passed to the last navigation
    pub fn navigated_to(&self) -> Option<&str> {
        self.navigated_to.as_deref()
    }

    /// Number of readiness polls answered
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Number of screenshots written
    pub fn screenshots(&self) -> usize {
        self.screenshots
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.closed {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn render_png(&self) -> SessionResult<Vec<u8>> {
        let img: RgbImage = ImageBuffer::from_pixel(self.width, self.height, image::Rgb(self.fill));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok(png)
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.ensure_open()?;
        if let Some(message) = &self.navigation_error {
            return Err(SessionError::Navigation(message.clone()));
        }
        self.navigated_to = Some(url.to_string());
        for line in &self.scripted_console {
            self.console.push(line.clone());
        }
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> SessionResult<Value> {
        self.ensure_open()?;

        if expression == BODY_TEXT_EXPRESSION {
            if let Some(message) = &self.body_error {
                return Err(SessionError::Evaluation(message.clone()));
            }
            // Before a successful navigation the page is still about:blank.
            if self.navigated_to.is_none() {
                return Ok(Value::String(String::new()));
            }
            return Ok(self
                .body_text
                .as_ref()
                .map(|text| Value::String(text.trim().to_string()))
                .unwrap_or(Value::Null));
        }

        if expression == self.ready_expression {
            let ready = matches!(self.ready_after, Some(after) if self.polls >= after);
            self.polls += 1;
            return Ok(Value::Bool(ready));
        }

        if expression == self.payload_expression {
            if let Some(message) = &self.payload_error {
                return Err(SessionError::Evaluation(message.clone()));
            }
            return Ok(self.payload.clone());
        }

        Ok(Value::Null)
    }

    async fn screenshot(&mut self, path: &Path) -> SessionResult<()> {
        self.ensure_open()?;
        if let Some(message) = &self.screenshot_error {
            return Err(SessionError::Screenshot(message.clone()));
        }
        let png = self.render_png()?;
        ensure_parent_dir(path)?;
        std::fs::write(path, png)?;
        self.screenshots += 1;
        Ok(())
    }

    fn console(&self) -> &ConsoleLog {
        &self.console
    }

    async fn close(&mut self) -> SessionResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readiness_turns_true_after_polls() {
        let mut session = MockSession::new().ready_after(2);
        session.navigate("http://localhost/").await.unwrap();
        let mut answers = Vec::new();
        for _ in 0..3 {
            answers.push(session.evaluate(DEFAULT_READY_EXPRESSION).await.unwrap());
        }
        assert_eq!(answers, vec![Value::Bool(false), Value::Bool(false), Value::Bool(true)]);
        assert_eq!(session.polls(), 3);
    }

    #[tokio::test]
    async fn test_body_text_without_document_is_empty() {
        let mut session = MockSession::new().without_document();
        session.navigate("http://localhost/").await.unwrap();
        assert_eq!(session.body_text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let mut session = MockSession::new();
        session.close().await.unwrap();
        assert!(matches!(
            session.navigate("http://localhost/").await,
            Err(SessionError::Closed)
        ));
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_screenshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shot.png");
        let mut session = MockSession::new().viewport(16, 8, [255, 0, 0]);
        session.screenshot(&path).await.unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (16, 8));
        assert_eq!(img.get_pixel(3, 3).0, [255, 0, 0]);
        assert_eq!(session.screenshots(), 1);
    }
}
