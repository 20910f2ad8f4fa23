//! Outcome classification.
//!
//! A pure function of the evidence: a payload with `ok: true` passes;
//! anything else fails, unless the captured page text or console shows
//! the browser itself lacks a required capability, in which case the run
//! is inconclusive. A pass is never downgraded.

use serde_json::Value;

use super::types::{Evidence, RunStatus, Verdict};
use crate::config::{DEFAULT_INCONCLUSIVE_MESSAGE, EnvironmentMarkers};

/// Whether the application payload explicitly reports success
pub fn payload_ok(payload: Option<&Value>) -> bool {
    matches!(payload.and_then(|p| p.get("ok")), Some(Value::Bool(true)))
}

/// Whether the evidence points at a missing browser capability
pub fn environment_limited(evidence: &Evidence<'_>, markers: &EnvironmentMarkers) -> bool {
    markers.matches_body(evidence.body_text) || markers.matches_console(evidence.console_lines)
}

/// Map collected evidence to a final verdict
pub fn classify(evidence: &Evidence<'_>, markers: &EnvironmentMarkers) -> Verdict {
    let error = evidence.error.unwrap_or_default().to_string();

    if payload_ok(evidence.payload) {
        return Verdict {
            status: RunStatus::Pass,
            ok: true,
            error,
        };
    }

    if environment_limited(evidence, markers) {
        return Verdict {
            status: RunStatus::Inconclusive,
            ok: false,
            error: if error.is_empty() {
                DEFAULT_INCONCLUSIVE_MESSAGE.to_string()
            } else {
                error
            },
        };
    }

    Verdict {
        status: RunStatus::Fail,
        ok: false,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn evidence<'a>(
        payload: Option<&'a Value>,
        error: Option<&'a str>,
        body_text: &'a str,
        console_lines: &'a [String],
    ) -> Evidence<'a> {
        Evidence {
            payload,
            error,
            body_text,
            console_lines,
        }
    }

    #[test]
    fn test_ok_payload_passes() {
        let payload = json!({"ok": true, "checks": 12});
        let verdict = classify(
            &evidence(Some(&payload), None, "", &[]),
            &EnvironmentMarkers::defaults(),
        );
        assert_eq!(verdict.status, RunStatus::Pass);
        assert!(verdict.ok);
        assert!(verdict.error.is_empty());
    }

    #[test]
    fn test_pass_is_never_downgraded() {
        let payload = json!({"ok": true});
        let console = vec!["WebGL2 context lost".to_string()];
        let verdict = classify(
            &evidence(Some(&payload), None, "WebGL2 missing", &console),
            &EnvironmentMarkers::defaults(),
        );
        assert_eq!(verdict.status, RunStatus::Pass);
        assert!(verdict.ok);
    }

    #[test]
    fn test_ok_must_be_boolean_true() {
        for payload in [json!({"ok": false}), json!({"ok": "true"}), json!({"ok": 1}), json!({})] {
            let verdict = classify(
                &evidence(Some(&payload), None, "", &[]),
                &EnvironmentMarkers::defaults(),
            );
            assert_eq!(verdict.status, RunStatus::Fail, "payload {}", payload);
            assert!(!verdict.ok);
        }
    }

    #[test]
    fn test_error_recorded_verbatim() {
        let verdict = classify(
            &evidence(None, Some("Navigation failed: net::ERR_CONNECTION_REFUSED"), "", &[]),
            &EnvironmentMarkers::defaults(),
        );
        assert_eq!(verdict.status, RunStatus::Fail);
        assert_eq!(verdict.error, "Navigation failed: net::ERR_CONNECTION_REFUSED");
    }

    #[test]
    fn test_body_marker_makes_inconclusive_with_default_message() {
        let verdict = classify(
            &evidence(None, None, "Error: WebGL2 is not available", &[]),
            &EnvironmentMarkers::defaults(),
        );
        assert_eq!(verdict.status, RunStatus::Inconclusive);
        assert!(!verdict.ok);
        assert_eq!(verdict.error, DEFAULT_INCONCLUSIVE_MESSAGE);
    }

    #[test]
    fn test_console_marker_keeps_existing_error() {
        let console = vec!["boot".to_string(), "WebGL2 not supported".to_string()];
        let verdict = classify(
            &evidence(None, Some("Timeout 45000ms exceeded"), "", &console),
            &EnvironmentMarkers::defaults(),
        );
        assert_eq!(verdict.status, RunStatus::Inconclusive);
        assert_eq!(verdict.error, "Timeout 45000ms exceeded");
    }

    #[test]
    fn test_failed_payload_with_marker_is_inconclusive() {
        let payload = json!({"ok": false});
        let verdict = classify(
            &evidence(
                Some(&payload),
                None,
                "The following features required to run Godot projects on the Web are missing",
                &[],
            ),
            &EnvironmentMarkers::defaults(),
        );
        assert_eq!(verdict.status, RunStatus::Inconclusive);
    }

    #[test]
    fn test_custom_markers() {
        let markers = EnvironmentMarkers {
            body: vec!["no GPU".to_string()],
            console: vec![],
        };
        let console = vec!["WebGL2 not supported".to_string()];
        let verdict = classify(&evidence(None, None, "", &console), &markers);
        assert_eq!(verdict.status, RunStatus::Fail);

        let verdict = classify(&evidence(None, None, "no GPU found", &[]), &markers);
        assert_eq!(verdict.status, RunStatus::Inconclusive);
    }
}
