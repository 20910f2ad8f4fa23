//! Chrome/Chromium session over the DevTools Protocol (chromiumoxide).
//!
//! Launching spawns two background tasks: the CDP handler loop that
//! drives the websocket, and a console listener that appends every
//! `console.*` call to the session's [`ConsoleLog`]. Neither task is
//! awaited by the harness pipeline.

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, RemoteObject, RemoteObjectType};
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{BrowserSession, ensure_parent_dir};
use super::console::ConsoleLog;
use super::types::{SessionError, SessionResult};
use crate::config::RunConfig;

/// Upper bound on starting the browser process
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(20);

/// A launched browser with a single page
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    console: ConsoleLog,
    handler_task: JoinHandle<()>,
    console_task: Option<JoinHandle<()>>,
}

impl ChromeSession {
    /// Launch a browser configured from `config` and open a blank page
    pub async fn launch(config: &RunConfig) -> SessionResult<Self> {
        let browser_config = browser_config(config)?;

        info!(
            headless = config.headless,
            args = ?config.launch_args,
            "launching browser"
        );
        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("CDP handler event loop ended");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "failed to close browser after page creation error");
                }
                handler_task.abort();
                return Err(SessionError::Launch(format!("failed to open page: {}", e)));
            }
        };

        let console = ConsoleLog::new();
        let console_task = match page.event_listener::<EventConsoleApiCalled>().await {
            Ok(mut events) => {
                let sink = console.clone();
                Some(tokio::spawn(async move {
                    while let Some(event) = events.next().await {
                        sink.push(render_console_args(&event.args));
                    }
                }))
            }
            Err(e) => {
                // The run can still be classified without console lines.
                warn!(error = %e, "console listener unavailable");
                None
            }
        };

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            console,
            handler_task,
            console_task,
        })
    }

    fn page(&self) -> SessionResult<&Page> {
        self.page.as_ref().ok_or(SessionError::Closed)
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        debug!(url, "navigating");
        self.page()?
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> SessionResult<Value> {
        let result = self
            .page()?
            .evaluate(expression)
            .await
            .map_err(|e| SessionError::Evaluation(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn screenshot(&mut self, path: &Path) -> SessionResult<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();
        let bytes = self
            .page()?
            .screenshot(params)
            .await
            .map_err(|e| SessionError::Screenshot(e.to_string()))?;
        ensure_parent_dir(path)?;
        std::fs::write(path, bytes)?;
        debug!(path = %path.display(), "screenshot written");
        Ok(())
    }

    fn console(&self) -> &ConsoleLog {
        &self.console
    }

    async fn close(&mut self) -> SessionResult<()> {
        if let Some(task) = self.console_task.take() {
            task.abort();
        }
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!(error = %e, "page close failed");
            }
        }
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Launch(format!("failed to close browser: {}", e)));
        if let Err(e) = browser.wait().await {
            debug!(error = %e, "waiting for browser exit failed");
        }
        self.handler_task.abort();
        info!("browser closed");
        closed
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Dropping the Browser handle kills a still-running child process.
        if let Some(task) = self.console_task.take() {
            task.abort();
        }
        self.handler_task.abort();
    }
}

fn browser_config(config: &RunConfig) -> SessionResult<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .launch_timeout(LAUNCH_TIMEOUT)
        .args(config.launch_args.iter().cloned());

    // A zero timeout leaves CDP requests on chromiumoxide's own default.
    if !config.timeout.is_zero() {
        builder = builder.request_timeout(config.timeout);
    }

    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(executable) = &config.chrome_executable {
        builder = builder.chrome_executable(executable.clone());
    }

    builder
        .build()
        .map_err(|e| SessionError::Launch(format!("invalid browser configuration: {}", e)))
}

/// Space-join the string form of each console argument
fn render_console_args(args: &[RemoteObject]) -> String {
    args.iter().map(render_console_arg).collect::<Vec<_>>().join(" ")
}

fn render_console_arg(arg: &RemoteObject) -> String {
    match (&arg.value, &arg.description) {
        (Some(Value::String(text)), _) => text.clone(),
        (Some(value), _) => value.to_string(),
        (None, Some(description)) => description.clone(),
        (None, None) => match &arg.unserializable_value {
            // NaN, Infinity, -0 and bigint literals
            Some(unserializable) => unserializable.inner().clone(),
            None => match arg.r#type {
                RemoteObjectType::Undefined => "undefined".to_string(),
                ref other => format!("{:?}", other).to_lowercase(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remote(wire: Value) -> RemoteObject {
        serde_json::from_value(wire).unwrap()
    }

    #[test]
    fn test_console_args_render_like_the_page_console() {
        let args = vec![
            remote(json!({"type": "string", "value": "frame"})),
            remote(json!({"type": "number", "value": 42, "description": "42"})),
            remote(json!({"type": "object", "className": "Object", "description": "Object", "objectId": "1.2.3"})),
            remote(json!({"type": "undefined"})),
        ];
        assert_eq!(render_console_args(&args), "frame 42 Object undefined");
    }

    #[test]
    fn test_unserializable_numbers_keep_their_literal() {
        let args = vec![
            remote(json!({"type": "number", "unserializableValue": "NaN"})),
            remote(json!({"type": "bigint", "unserializableValue": "12n"})),
        ];
        assert_eq!(render_console_args(&args), "NaN 12n");
    }

    #[test]
    fn test_valueless_argument_falls_back_to_its_type() {
        let args = vec![remote(json!({"type": "symbol"}))];
        assert_eq!(render_console_args(&args), "symbol");
        assert_eq!(render_console_args(&[]), "");
    }

    #[test]
    fn test_zero_timeout_builds_a_config() {
        let config = RunConfig::defaults()
            .with_timeout(Duration::ZERO)
            .with_chrome_executable("/usr/bin/chromium");
        assert!(browser_config(&config).is_ok());
    }
}
