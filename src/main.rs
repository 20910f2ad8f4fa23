use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use browser_qa::RunConfig;
use browser_qa::harness::{self, report};

/// Browser QA - load a page, wait for its QA signal and report the outcome
#[derive(Parser, Debug)]
#[command(
    name = "browser-qa",
    about = "Headless browser QA harness: waits for a page's readiness signal and classifies the run",
    after_help = "ENVIRONMENT VARIABLES:\n\
        BROWSER_QA_URL              Target page URL\n\
        BROWSER_QA_REPORT           JSON report path\n\
        BROWSER_QA_SCREENSHOT       PNG screenshot path\n\
        BROWSER_QA_TIMEOUT_MS       Readiness timeout (ms)\n\
        BROWSER_QA_HEADLESS         Set to 0 for a headed browser\n\
        BROWSER_QA_BROWSER_ARGS     Whitespace-separated browser launch arguments\n\
        BROWSER_QA_READY_EXPR       Readiness expression\n\
        BROWSER_QA_PAYLOAD_EXPR     Payload expression\n\
        BROWSER_QA_POLL_MS          Readiness poll interval (ms)\n\
        BROWSER_QA_BODY_MARKERS     |-separated body text markers for inconclusive runs\n\
        BROWSER_QA_CONSOLE_MARKERS  |-separated console markers for inconclusive runs\n\
        BROWSER_QA_CHROME           Chrome/Chromium executable\n\
        BROWSER_QA_LOG              Log level when RUST_LOG is unset\n\n\
        EXIT CODES:\n\
        0  pass or inconclusive\n\
        1  report could not be written\n\
        2  fail"
)]
struct Args {
    /// Target page URL
    #[arg(long)]
    url: Option<String>,

    /// JSON report path
    #[arg(long)]
    report: Option<PathBuf>,

    /// PNG screenshot path
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Readiness timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,

    /// Browser launch argument (repeatable; replaces the defaults)
    #[arg(long = "browser-arg", allow_hyphen_values = true)]
    browser_args: Vec<String>,

    /// Readiness expression
    #[arg(long)]
    ready_expr: Option<String>,

    /// Payload expression
    #[arg(long)]
    payload_expr: Option<String>,

    /// Readiness poll interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Chrome/Chromium executable
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "BROWSER_QA_LOG", default_value = "warn")]
    log_level: String,

    /// Also print the report JSON to stdout
    #[arg(long)]
    print_report: bool,
}

impl Args {
    /// Environment first, flags on top
    fn into_config(self) -> RunConfig {
        let mut config = RunConfig::from_env();
        if let Some(url) = self.url {
            config = config.with_url(url);
        }
        if let Some(path) = self.report {
            config = config.with_report_path(path);
        }
        if let Some(path) = self.screenshot {
            config = config.with_screenshot_path(path);
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if self.headed {
            config = config.with_headless(false);
        }
        if !self.browser_args.is_empty() {
            config = config.with_launch_args(self.browser_args);
        }
        if let Some(expr) = self.ready_expr {
            config = config.with_ready_expression(expr);
        }
        if let Some(expr) = self.payload_expr {
            config = config.with_payload_expression(expr);
        }
        if let Some(ms) = self.poll_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(path) = self.chrome {
            config = config.with_chrome_executable(path);
        }
        config
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let print_report = args.print_report;
    let config = args.into_config();

    let result = harness::run(&config).await;

    // A run whose report cannot be written has no outcome.
    report::write_report(&result, &config.report_path)?;

    if print_report {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    report::print_outcome(&result, &config.report_path);

    Ok(ExitCode::from(report::exit_code(result.status)))
}
