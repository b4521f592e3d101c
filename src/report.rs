//! Console report rendering.
//!
//! Everything the operator reads goes through here. Functions take any
//! `io::Write` so runs can be captured in tests; `main` hands them stdout.

use std::io::{self, Write};

use colored::Colorize;

use crate::checker::{CheckOutcome, Endpoint, StatusVerdict};
use crate::config::SmokeConfig;
use crate::runner::RunSummary;

const RULE_WIDTH: usize = 50;

pub const TITLE: &str = "🚀 Dittofeed Deployment Test";
pub const SUMMARY_TITLE: &str = "📊 Test Summary";

/// Hints printed when any check fails
pub const TROUBLESHOOTING_HINTS: [&str; 4] = [
    "Verify Cloudflare tunnel is connected",
    "Check if all services are running in Coolify",
    "Ensure DATABASE_URL is properly formatted",
    "Verify PostgreSQL database 'dittofeed' exists",
];

/// Blank line, then the title framed by horizontal rules.
pub fn header<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out)?;
    writeln!(out, "{}", rule.blue())?;
    writeln!(out, "{}", title.blue())?;
    writeln!(out, "{}", rule.blue())
}

pub fn config_banner<W: Write>(out: &mut W, config: &SmokeConfig) -> io::Result<()> {
    writeln!(out, "\nConfiguration:")?;
    writeln!(out, "  API URL: {}", config.api_url)?;
    writeln!(out, "  Dashboard URL: {}", config.dashboard_url)?;
    writeln!(out, "  Auth Mode: {}", config.auth_mode)
}

pub fn testing_line<W: Write>(out: &mut W, endpoint: &Endpoint) -> io::Result<()> {
    writeln!(out, "Testing {}: {}", endpoint.display_name, endpoint.url)
}

pub fn outcome_line<W: Write>(
    out: &mut W,
    endpoint: &Endpoint,
    outcome: &CheckOutcome,
) -> io::Result<()> {
    let line = match outcome {
        CheckOutcome::Status { code, verdict } => match verdict {
            StatusVerdict::Expected => format!("✅ Success (HTTP {})", code).green(),
            StatusVerdict::Accepted => format!("✅ OK (HTTP {})", code).green(),
            StatusVerdict::Failed => format!("❌ Failed (HTTP {})", code).red(),
        },
        CheckOutcome::Healthy { payload } => {
            let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
            format!("✅ {}: {}", endpoint.display_name, pretty).green()
        }
        CheckOutcome::Error(err) => format!("❌ {}", err).red(),
    };
    writeln!(out, "  {}", line)
}

/// Results table, totals, then either the access block or troubleshooting hints.
pub fn summary<W: Write>(out: &mut W, summary: &RunSummary, config: &SmokeConfig) -> io::Result<()> {
    header(out, SUMMARY_TITLE)?;

    writeln!(out, "\nResults:")?;
    for result in summary.results() {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "  {}: {}", result.name, status)?;
    }

    let total = format!(
        "Total: {}/{} tests passed",
        summary.passed(),
        summary.total()
    );
    writeln!(out, "\n{}", total.blue())?;

    if summary.all_passed() {
        writeln!(
            out,
            "\n{}",
            "🎉 All tests passed! Deployment is operational.".green()
        )?;
        writeln!(out, "\nAccess your Dittofeed instance:")?;
        writeln!(out, "  Dashboard: {}", config.dashboard_url)?;
        writeln!(out, "  API: {}", config.api_url)?;
    } else {
        writeln!(
            out,
            "\n{}",
            "⚠️  Some tests failed. Check the logs above.".yellow()
        )?;
        writeln!(out, "\nTroubleshooting:")?;
        for (i, hint) in TROUBLESHOOTING_HINTS.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, hint)?;
        }
    }

    Ok(())
}
