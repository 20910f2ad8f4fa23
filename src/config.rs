//! Run configuration with environment variable support.
//!
//! A [`RunConfig`] is built once at the process boundary and passed by
//! reference into the harness. Every field has a default, and every field
//! can be overridden from the environment:
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BROWSER_QA_URL` | Target page URL | `http://127.0.0.1:8060/?qa_objective_auto=1` |
//! | `BROWSER_QA_REPORT` | JSON report path | `docs/reports/qa_browser_objective_latest.json` |
//! | `BROWSER_QA_SCREENSHOT` | PNG screenshot path | `docs/reports/qa_browser_objective_latest.png` |
//! | `BROWSER_QA_TIMEOUT_MS` | Readiness timeout (ms), 0 waits without a limit | `45000` |
//! | `BROWSER_QA_HEADLESS` | `0` runs a headed browser | `1` |
//! | `BROWSER_QA_BROWSER_ARGS` | Whitespace-separated launch arguments | software GL flags |
//! | `BROWSER_QA_READY_EXPR` | Readiness expression | `window.__celadoraObjectiveQaReady === true` |
//! | `BROWSER_QA_PAYLOAD_EXPR` | Payload expression | `window.__celadoraObjectiveQa \|\| null` |
//! | `BROWSER_QA_POLL_MS` | Readiness poll interval (ms) | `100` |
//! | `BROWSER_QA_BODY_MARKERS` | `\|`-separated body text markers | see [`DEFAULT_BODY_MARKERS`] |
//! | `BROWSER_QA_CONSOLE_MARKERS` | `\|`-separated console markers | see [`DEFAULT_CONSOLE_MARKERS`] |
//! | `BROWSER_QA_CHROME` | Chrome/Chromium executable | auto-detected |
//!
//! # Example
//!
//! ```bash
//! export BROWSER_QA_URL="http://127.0.0.1:9000/?qa_objective_auto=1"
//! export BROWSER_QA_TIMEOUT_MS=90000
//! export BROWSER_QA_HEADLESS=0
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

// ============================================================================
// Default Values
// ============================================================================

/// Default target URL (enables the application's automatic QA mode)
pub const DEFAULT_URL: &str = "http://127.0.0.1:8060/?qa_objective_auto=1";

/// Default report artifact path, relative to the working directory
pub const DEFAULT_REPORT_PATH: &str = "docs/reports/qa_browser_objective_latest.json";

/// Default screenshot artifact path, relative to the working directory
pub const DEFAULT_SCREENSHOT_PATH: &str = "docs/reports/qa_browser_objective_latest.png";

/// Default readiness timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 45_000;

/// Default readiness poll interval (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Launch arguments used when none are supplied.
///
/// Headless hosts rarely expose a GPU, so these force SwiftShader-backed WebGL.
pub const DEFAULT_LAUNCH_ARGS: &[&str] = &[
    "--ignore-gpu-blocklist",
    "--enable-webgl",
    "--enable-webgl2-compute-context",
    "--use-angle=swiftshader-webgl",
    "--enable-unsafe-swiftshader",
];

/// Expression that evaluates to `true` once the page is ready for inspection
pub const DEFAULT_READY_EXPRESSION: &str = "window.__celadoraObjectiveQaReady === true";

/// Expression that yields the application's result object (or `null`)
pub const DEFAULT_PAYLOAD_EXPRESSION: &str = "window.__celadoraObjectiveQa || null";

/// Body text fragments that identify a missing browser capability
pub const DEFAULT_BODY_MARKERS: &[&str] = &[
    "required to run Godot projects on the Web are missing",
    "WebGL2",
];

/// Console line fragments that identify a missing browser capability
pub const DEFAULT_CONSOLE_MARKERS: &[&str] = &["WebGL2"];

/// Error text recorded when a run is inconclusive and nothing else was raised
pub const DEFAULT_INCONCLUSIVE_MESSAGE: &str =
    "WebGL2 unsupported in this headless browser environment.";

/// Maximum number of characters of body text kept in the report
pub const MAX_BODY_TEXT_CHARS: usize = 1000;

/// Maximum number of console lines kept in the report
pub const MAX_CONSOLE_TAIL: usize = 40;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the target URL
pub const ENV_URL: &str = "BROWSER_QA_URL";

/// Environment variable for the report path
pub const ENV_REPORT: &str = "BROWSER_QA_REPORT";

/// Environment variable for the screenshot path
pub const ENV_SCREENSHOT: &str = "BROWSER_QA_SCREENSHOT";

/// Environment variable for the readiness timeout
pub const ENV_TIMEOUT_MS: &str = "BROWSER_QA_TIMEOUT_MS";

/// Environment variable for the headless flag
pub const ENV_HEADLESS: &str = "BROWSER_QA_HEADLESS";

/// Environment variable for browser launch arguments
pub const ENV_BROWSER_ARGS: &str = "BROWSER_QA_BROWSER_ARGS";

/// Environment variable for the readiness expression
pub const ENV_READY_EXPR: &str = "BROWSER_QA_READY_EXPR";

/// Environment variable for the payload expression
pub const ENV_PAYLOAD_EXPR: &str = "BROWSER_QA_PAYLOAD_EXPR";

/// Environment variable for the readiness poll interval
pub const ENV_POLL_MS: &str = "BROWSER_QA_POLL_MS";

/// Environment variable for body text markers
pub const ENV_BODY_MARKERS: &str = "BROWSER_QA_BODY_MARKERS";

/// Environment variable for console markers
pub const ENV_CONSOLE_MARKERS: &str = "BROWSER_QA_CONSOLE_MARKERS";

/// Environment variable for the browser executable
pub const ENV_CHROME: &str = "BROWSER_QA_CHROME";

// ============================================================================
// Configuration
// ============================================================================

/// Marker fragments that reclassify a failed run as inconclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMarkers {
    /// Matched against the captured body text
    pub body: Vec<String>,
    /// Matched against every captured console line
    pub console: Vec<String>,
}

impl EnvironmentMarkers {
    /// Markers from the environment, falling back to the built-in set
    pub fn from_env() -> Self {
        Self {
            body: env::var(ENV_BODY_MARKERS)
                .ok()
                .map(|raw| parse_markers(&raw))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| to_owned_list(DEFAULT_BODY_MARKERS)),
            console: env::var(ENV_CONSOLE_MARKERS)
                .ok()
                .map(|raw| parse_markers(&raw))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| to_owned_list(DEFAULT_CONSOLE_MARKERS)),
        }
    }

    /// The built-in marker set
    pub fn defaults() -> Self {
        Self {
            body: to_owned_list(DEFAULT_BODY_MARKERS),
            console: to_owned_list(DEFAULT_CONSOLE_MARKERS),
        }
    }

    /// Whether the body text contains any body marker
    pub fn matches_body(&self, body_text: &str) -> bool {
        self.body.iter().any(|m| body_text.contains(m.as_str()))
    }

    /// Whether any console line contains any console marker
    pub fn matches_console(&self, lines: &[String]) -> bool {
        lines
            .iter()
            .any(|line| self.console.iter().any(|m| line.contains(m.as_str())))
    }
}

impl Default for EnvironmentMarkers {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Immutable configuration for a single harness run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Page to load
    pub url: String,
    /// Where the JSON report is written
    pub report_path: PathBuf,
    /// Where the PNG screenshot is written
    pub screenshot_path: PathBuf,
    /// Bound on navigation, the readiness wait and payload evaluation;
    /// zero waits without a limit
    pub timeout: Duration,
    /// Run the browser without a window
    pub headless: bool,
    /// Browser launch arguments (never empty)
    pub launch_args: Vec<String>,
    /// Readiness signal expression
    pub ready_expression: String,
    /// Payload expression
    pub payload_expression: String,
    /// Delay between readiness polls
    pub poll_interval: Duration,
    /// Environment-limitation markers
    pub markers: EnvironmentMarkers,
    /// Explicit browser executable
    pub chrome_executable: Option<PathBuf>,
}

impl RunConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let timeout_ms = parse_millis(ENV_TIMEOUT_MS, DEFAULT_TIMEOUT_MS);
        let poll_ms = parse_millis(ENV_POLL_MS, DEFAULT_POLL_INTERVAL_MS);

        Self {
            url: env::var(ENV_URL).unwrap_or_else(|_| DEFAULT_URL.to_string()),
            report_path: resolve_path(
                env::var(ENV_REPORT).unwrap_or_else(|_| DEFAULT_REPORT_PATH.to_string()),
            ),
            screenshot_path: resolve_path(
                env::var(ENV_SCREENSHOT).unwrap_or_else(|_| DEFAULT_SCREENSHOT_PATH.to_string()),
            ),
            timeout: Duration::from_millis(timeout_ms),
            headless: parse_headless(env::var(ENV_HEADLESS).ok().as_deref()),
            launch_args: parse_launch_args(&env::var(ENV_BROWSER_ARGS).unwrap_or_default()),
            ready_expression: env::var(ENV_READY_EXPR)
                .unwrap_or_else(|_| DEFAULT_READY_EXPRESSION.to_string()),
            payload_expression: env::var(ENV_PAYLOAD_EXPR)
                .unwrap_or_else(|_| DEFAULT_PAYLOAD_EXPRESSION.to_string()),
            poll_interval: Duration::from_millis(poll_ms),
            markers: EnvironmentMarkers::from_env(),
            chrome_executable: env::var(ENV_CHROME)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            report_path: resolve_path(DEFAULT_REPORT_PATH),
            screenshot_path: resolve_path(DEFAULT_SCREENSHOT_PATH),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            headless: true,
            launch_args: default_launch_args(),
            ready_expression: DEFAULT_READY_EXPRESSION.to_string(),
            payload_expression: DEFAULT_PAYLOAD_EXPRESSION.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            markers: EnvironmentMarkers::defaults(),
            chrome_executable: None,
        }
    }

    /// Set the target URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the report path
    pub fn with_report_path(mut self, path: impl AsRef<Path>) -> Self {
        self.report_path = resolve_path(path);
        self
    }

    /// Set the screenshot path
    pub fn with_screenshot_path(mut self, path: impl AsRef<Path>) -> Self {
        self.screenshot_path = resolve_path(path);
        self
    }

    /// Set the readiness timeout (`Duration::ZERO` disables it)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the headless flag
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Replace the launch arguments; an empty list keeps the default set
    pub fn with_launch_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args
            .into_iter()
            .map(Into::into)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        self.launch_args = if args.is_empty() {
            default_launch_args()
        } else {
            args
        };
        self
    }

    /// Set the readiness expression
    pub fn with_ready_expression(mut self, expression: impl Into<String>) -> Self {
        self.ready_expression = expression.into();
        self
    }

    /// Set the payload expression
    pub fn with_payload_expression(mut self, expression: impl Into<String>) -> Self {
        self.payload_expression = expression.into();
        self
    }

    /// Set the readiness poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the environment-limitation markers
    pub fn with_markers(mut self, markers: EnvironmentMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Set an explicit browser executable
    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    /// Timeout in whole milliseconds, as echoed in the report
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// The default launch arguments as owned strings
pub fn default_launch_args() -> Vec<String> {
    to_owned_list(DEFAULT_LAUNCH_ARGS)
}

/// Split a whitespace-separated argument string; empty input yields the defaults
pub fn parse_launch_args(raw: &str) -> Vec<String> {
    let args: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    if args.is_empty() {
        default_launch_args()
    } else {
        args
    }
}

/// Only an explicit `0` turns headless mode off
fn parse_headless(raw: Option<&str>) -> bool {
    raw.map(|v| v.trim() != "0").unwrap_or(true)
}

/// Split a `|`-separated marker list, dropping empty entries
fn parse_markers(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_millis(var: &str, default: u64) -> u64 {
    match env::var(var) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = var, value = %raw, default, "ignoring unparsable duration");
                default
            }
        },
        Err(_) => default,
    }
}

/// Resolve a relative path against the working directory
fn resolve_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_launch_args_splits_on_whitespace() {
        assert_eq!(
            parse_launch_args("  --foo   --bar=1\t--baz "),
            vec!["--foo", "--bar=1", "--baz"]
        );
    }

    #[test]
    fn test_parse_launch_args_empty_uses_defaults() {
        assert_eq!(parse_launch_args(""), default_launch_args());
        assert_eq!(parse_launch_args("   \n"), default_launch_args());
        assert!(!default_launch_args().is_empty());
    }

    #[test]
    fn test_parse_headless() {
        assert!(parse_headless(None));
        assert!(parse_headless(Some("1")));
        assert!(parse_headless(Some("false")));
        assert!(!parse_headless(Some("0")));
        assert!(!parse_headless(Some(" 0 ")));
    }

    #[test]
    fn test_parse_markers() {
        assert_eq!(parse_markers("WebGL2| no gpu |"), vec!["WebGL2", "no gpu"]);
        assert!(parse_markers(" | ").is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = RunConfig::defaults();
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert!(config.headless);
        assert!(config.report_path.is_absolute());
        assert!(config.report_path.ends_with(DEFAULT_REPORT_PATH));
        assert_eq!(config.launch_args, default_launch_args());
    }

    #[test]
    fn test_with_launch_args_never_empty() {
        let config = RunConfig::defaults().with_launch_args(Vec::<String>::new());
        assert_eq!(config.launch_args, default_launch_args());

        let config = RunConfig::defaults().with_launch_args(["--mute-audio", " "]);
        assert_eq!(config.launch_args, vec!["--mute-audio"]);
    }

    #[test]
    fn test_marker_matching() {
        let markers = EnvironmentMarkers::defaults();
        assert!(markers.matches_body("Your browser lacks WebGL2 support"));
        assert!(markers.matches_body(
            "The following features required to run Godot projects on the Web are missing"
        ));
        assert!(!markers.matches_body("All systems nominal"));
        assert!(markers.matches_console(&["ok".to_string(), "WebGL2 context lost".to_string()]));
        assert!(!markers.matches_console(&["ok".to_string()]));
    }
}
