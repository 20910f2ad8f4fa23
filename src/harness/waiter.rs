//! Readiness waiting.
//!
//! Navigate, poll the readiness expression until it yields `true`, then
//! read the payload. Every phase is bounded by the configured timeout and
//! a single timeout ends the wait; nothing is retried. A zero timeout
//! leaves every phase unbounded.

use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::types::{HarnessError, HarnessResult};
use crate::browser::{BrowserSession, SessionError, SessionResult};
use crate::config::RunConfig;

/// Navigate to the target and return the payload once the page is ready.
///
/// `Ok(None)` means the page became ready but exposed no result object.
pub async fn await_payload<S>(session: &mut S, config: &RunConfig) -> HarnessResult<Option<Value>>
where
    S: BrowserSession + ?Sized,
{
    info!(url = %config.url, "navigating to target");
    bounded("navigation", config.timeout, session.navigate(&config.url)).await?;

    wait_until_ready(session, config).await?;
    info!("readiness signal observed");

    let payload = bounded(
        "payload evaluation",
        config.timeout,
        session.evaluate(&config.payload_expression),
    )
    .await?;

    Ok(match payload {
        Value::Null => None,
        payload => Some(payload),
    })
}

/// Poll the readiness expression until it is `true` or the timeout elapses.
///
/// The expression is always evaluated at least once. A zero timeout waits
/// without a limit. Evaluation errors while polling (the page may still be
/// replacing its execution context) count as "not ready"; the last one is
/// reported if the wait times out. A closed session ends the wait immediately.
pub async fn wait_until_ready<S>(session: &mut S, config: &RunConfig) -> HarnessResult<()>
where
    S: BrowserSession + ?Sized,
{
    let deadline = deadline_after(config.timeout);
    let mut last_error: Option<String> = None;
    let mut polls = 0usize;

    loop {
        polls += 1;
        let poll = session.evaluate(&config.ready_expression);
        // timeout_at polls the evaluation before looking at the deadline.
        let answer = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, poll).await {
                Ok(answer) => answer,
                Err(_) => break,
            },
            None => poll.await,
        };

        match answer {
            Ok(Value::Bool(true)) => {
                debug!(polls, "page is ready");
                return Ok(());
            }
            Ok(value) => {
                debug!(polls, %value, "page not ready yet");
            }
            Err(SessionError::Closed) => {
                return Err(HarnessError::Session(SessionError::Closed));
            }
            Err(err) => {
                debug!(polls, error = %err, "readiness poll failed");
                last_error = Some(err.to_string());
            }
        }

        let pause = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                config.poll_interval.min(remaining)
            }
            None => config.poll_interval,
        };
        tokio::time::sleep(pause).await;
    }

    Err(HarnessError::Timeout {
        phase: "readiness signal",
        after: config.timeout,
        last_error,
    })
}

/// Run one session call under a deadline; a zero bound means no deadline
async fn bounded<T, F>(phase: &'static str, after: Duration, call: F) -> HarnessResult<T>
where
    F: Future<Output = SessionResult<T>>,
{
    if after.is_zero() {
        return call.await.map_err(HarnessError::from);
    }
    match tokio::time::timeout(after, call).await {
        Ok(result) => result.map_err(HarnessError::from),
        Err(_) => Err(HarnessError::Timeout {
            phase,
            after,
            last_error: None,
        }),
    }
}

fn deadline_after(timeout: Duration) -> Option<Instant> {
    if timeout.is_zero() {
        None
    } else {
        Some(Instant::now() + timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockSession;
    use serde_json::json;

    fn fast_config() -> RunConfig {
        RunConfig::defaults()
            .with_url("http://127.0.0.1:9/")
            .with_timeout(Duration::from_millis(200))
            .with_poll_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_payload_after_polls() {
        let mut session = MockSession::new()
            .ready_after(3)
            .payload(json!({"ok": true}));
        let payload = await_payload(&mut session, &fast_config()).await.unwrap();
        assert_eq!(payload, Some(json!({"ok": true})));
        assert_eq!(session.polls(), 4);
        assert_eq!(session.navigated_to(), Some("http://127.0.0.1:9/"));
    }

    #[tokio::test]
    async fn test_null_payload_is_none() {
        let mut session = MockSession::new();
        let payload = await_payload(&mut session, &fast_config()).await.unwrap();
        assert_eq!(payload, None);
    }

    #[tokio::test]
    async fn test_never_ready_times_out() {
        let mut session = MockSession::new().never_ready();
        let err = await_payload(&mut session, &fast_config()).await.unwrap_err();
        assert!(matches!(err, HarnessError::Timeout { phase: "readiness signal", .. }));
        assert!(session.polls() > 1);
    }

    #[tokio::test]
    async fn test_navigation_error_propagates_without_polling() {
        let mut session = MockSession::new().fail_navigation("net::ERR_CONNECTION_REFUSED");
        let err = await_payload(&mut session, &fast_config()).await.unwrap_err();
        assert_eq!(err.to_string(), "Navigation failed: net::ERR_CONNECTION_REFUSED");
        assert_eq!(session.polls(), 0);
    }

    #[tokio::test]
    async fn test_zero_timeout_waits_without_limit() {
        let config = fast_config().with_timeout(Duration::ZERO);
        let mut session = MockSession::new().payload(json!({"ok": true}));
        let payload = await_payload(&mut session, &config).await.unwrap();
        assert_eq!(payload, Some(json!({"ok": true})));
        assert_eq!(session.polls(), 1);

        let mut session = MockSession::new().ready_after(5);
        await_payload(&mut session, &config).await.unwrap();
        assert_eq!(session.polls(), 6);
    }

    #[tokio::test]
    async fn test_ready_page_is_polled_before_deadline_check() {
        let config = fast_config().with_timeout(Duration::from_nanos(1));
        let mut session = MockSession::new();
        wait_until_ready(&mut session, &config).await.unwrap();
        assert_eq!(session.polls(), 1);
    }

    #[tokio::test]
    async fn test_payload_error_propagates() {
        let mut session = MockSession::new().fail_payload("context destroyed");
        let err = await_payload(&mut session, &fast_config()).await.unwrap_err();
        assert!(matches!(err, HarnessError::Session(SessionError::Evaluation(_))));
    }
}
