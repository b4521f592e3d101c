//! smokecheck: deployment smoke tester.
//!
//! This is the binary entry point. It parses arguments, resolves configuration
//! from flags, environment and an optional TOML file, initializes tracing on
//! stderr, runs the checks against stdout, and maps the result to an exit code.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smokecheck::config::{FileConfig, LogFormat, Overrides, SmokeConfig, DEFAULT_LOG_FILTER};
use smokecheck::{AppError, EndpointChecker};

/// Exit status for failures before or outside the checks
const EXIT_STARTUP_FAILURE: u8 = 2;

/// smokecheck: smoke tests for a deployed web application
#[derive(Parser, Debug)]
#[command(name = "smokecheck", version, about)]
struct Args {
    /// API base URL
    #[arg(long, env = "API_URL")]
    api_url: Option<String>,

    /// Dashboard base URL
    #[arg(long, env = "DASHBOARD_URL")]
    dashboard_url: Option<String>,

    /// Auth mode; "multi-tenant" adds the workspaces check
    #[arg(long, env = "AUTH_MODE")]
    auth_mode: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level filter (e.g., "smokecheck=debug")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format for stderr diagnostics: text or json
    #[arg(long)]
    log_format: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    match run(args).await {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            tracing::error!(error = %err, "Smoke run aborted");
            eprintln!("smokecheck: {}", err);
            ExitCode::from(EXIT_STARTUP_FAILURE)
        }
    }
}

async fn run(args: Args) -> Result<u8, AppError> {
    let file = args.config.as_deref().map(FileConfig::load).transpose()?;
    let overrides = Overrides {
        api_url: args.api_url,
        dashboard_url: args.dashboard_url,
        auth_mode: args.auth_mode,
        timeout_seconds: args.timeout,
        log_format: args.log_format,
    };
    let config = SmokeConfig::resolve(overrides, file)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    init_tracing(&log_filter, config.logging.format);

    tracing::debug!(
        api_url = %config.api_url,
        dashboard_url = %config.dashboard_url,
        auth_mode = %config.auth_mode,
        timeout_secs = config.timeout.as_secs(),
        "Resolved configuration"
    );

    let checker = EndpointChecker::new(config.timeout).map_err(AppError::Client)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = smokecheck::run(&config, &checker, &mut out).await?;

    Ok(summary.exit_status())
}

fn init_tracing(filter: &str, format: LogFormat) {
    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(filter));

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
