//! Smoke run orchestration.
//!
//! Builds the fixed check plan from the configuration, runs each check in
//! order, prints as it goes, and collects a [`RunSummary`].

use std::io::{self, Write};

use tracing::Instrument;
use uuid::Uuid;

use crate::checker::{CheckOutcome, Endpoint, EndpointChecker, EndpointKind};
use crate::config::SmokeConfig;
use crate::report;

/// A titled group of checks printed under one header.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: &'static str,
    pub endpoints: Vec<Endpoint>,
}

/// The checks to run, in order. The workspace section only exists in
/// multi-tenant mode.
pub fn plan(config: &SmokeConfig) -> Vec<Section> {
    let mut sections = vec![Section {
        title: "1. External Endpoint Tests",
        endpoints: vec![
            Endpoint::health("API Health", config.health_url()),
            Endpoint::new("API Root", config.api_root_url()),
            Endpoint::new("Dashboard", config.dashboard_root_url()),
        ],
    }];

    if config.is_multi_tenant() {
        sections.push(Section {
            title: "2. Multi-Tenant Endpoints",
            endpoints: vec![Endpoint::new("Workspaces", config.workspaces_url())
                .with_display_name("Workspaces API")],
        });
    }

    sections
}

/// Name and pass flag of one finished check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
        }
    }
}

/// Ordered results of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    results: Vec<CheckResult>,
}

impl From<Vec<CheckResult>> for RunSummary {
    fn from(results: Vec<CheckResult>) -> Self {
        Self { results }
    }
}

impl RunSummary {
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Process exit status: 0 when every check passed, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }

    fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }
}

/// Run every planned check and print the full report to `out`.
///
/// Check failures never end the run early; only a failed write does.
pub async fn run<W: Write>(
    config: &SmokeConfig,
    checker: &EndpointChecker,
    out: &mut W,
) -> io::Result<RunSummary> {
    let span = tracing::info_span!(
        "smoke_run",
        run_id = %Uuid::new_v4(),
        auth_mode = %config.auth_mode,
    );

    async move {
        report::header(out, report::TITLE)?;
        report::config_banner(out, config)?;

        let mut summary = RunSummary::default();
        for section in plan(config) {
            report::header(out, section.title)?;
            for endpoint in &section.endpoints {
                // A health payload stands in for the "Testing" line, so it is
                // only known after the request.
                let outcome = match endpoint.kind {
                    EndpointKind::Plain => {
                        report::testing_line(out, endpoint)?;
                        checker.check(endpoint).await
                    }
                    EndpointKind::Health => {
                        let outcome = checker.check(endpoint).await;
                        if !matches!(outcome, CheckOutcome::Healthy { .. }) {
                            report::testing_line(out, endpoint)?;
                        }
                        outcome
                    }
                };
                report::outcome_line(out, endpoint, &outcome)?;
                summary.push(CheckResult::new(endpoint.label.clone(), outcome.passed()));
            }
        }

        report::summary(out, &summary, config)?;
        tracing::info!(
            passed = summary.passed(),
            total = summary.total(),
            "Smoke run finished"
        );

        Ok::<_, io::Error>(summary)
    }
    .instrument(span)
    .await
}
