//! HTTP endpoint checks.
//!
//! A check is one GET request whose status code is sorted into pass or fail.
//! Transport failures never escape: they become a failed [`CheckOutcome`] so
//! the caller always gets a result for every endpoint.

use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use serde_json::Value;

use crate::config::{ACCEPTED_STATUSES, DEFAULT_EXPECTED_STATUS, MAX_REDIRECTS, USER_AGENT};
use crate::error::CheckError;

/// How a status code compares against what the check wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusVerdict {
    /// Exactly the expected status
    Expected,
    /// Not the expected status, but one of the always-accepted codes
    Accepted,
    Failed,
}

impl StatusVerdict {
    pub fn passed(self) -> bool {
        !matches!(self, StatusVerdict::Failed)
    }
}

/// Classify a status code. The expected status wins over the accepted set.
pub fn classify_status(status: u16, expected: u16) -> StatusVerdict {
    if status == expected {
        StatusVerdict::Expected
    } else if ACCEPTED_STATUSES.contains(&status) {
        StatusVerdict::Accepted
    } else {
        StatusVerdict::Failed
    }
}

/// Which checking routine an endpoint goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Status code only
    Plain,
    /// Status code plus a best-effort JSON dump of the body
    Health,
}

/// One endpoint to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Name recorded in the results table
    pub label: String,
    /// Name shown on the "Testing ..." line
    pub display_name: String,
    pub url: String,
    pub expected_status: u16,
    pub kind: EndpointKind,
}

impl Endpoint {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            display_name: label.clone(),
            label,
            url: url.into(),
            expected_status: DEFAULT_EXPECTED_STATUS,
            kind: EndpointKind::Plain,
        }
    }

    pub fn health(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Health,
            ..Self::new(label, url)
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }
}

/// Result of probing one endpoint.
#[derive(Debug)]
pub enum CheckOutcome {
    /// A response arrived and its status was classified
    Status { code: u16, verdict: StatusVerdict },
    /// Health endpoint answered 200 with a JSON body
    Healthy { payload: Value },
    /// No usable response
    Error(CheckError),
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        match self {
            CheckOutcome::Status { verdict, .. } => verdict.passed(),
            CheckOutcome::Healthy { .. } => true,
            CheckOutcome::Error(_) => false,
        }
    }
}

/// Issues checks with a shared client.
pub struct EndpointChecker {
    client: reqwest::Client,
    timeout: Duration,
}

impl EndpointChecker {
    /// Build a checker that follows redirects. `timeout` bounds the connect
    /// phase and each read separately, not the request as a whole.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, timeout })
    }

    pub async fn check(&self, endpoint: &Endpoint) -> CheckOutcome {
        let start = Instant::now();
        let outcome = match endpoint.kind {
            EndpointKind::Plain => self.check_status(endpoint).await,
            EndpointKind::Health => self.check_health(endpoint).await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            CheckOutcome::Status { code, verdict } if verdict.passed() => {
                tracing::debug!(url = %endpoint.url, status = code, duration_ms, "Check passed");
            }
            CheckOutcome::Status { code, .. } => {
                tracing::warn!(url = %endpoint.url, status = code, duration_ms, "Unexpected status");
            }
            CheckOutcome::Healthy { .. } => {
                tracing::debug!(url = %endpoint.url, status = 200, duration_ms, "Health payload received");
            }
            CheckOutcome::Error(err) => {
                tracing::warn!(
                    url = %endpoint.url,
                    kind = err.kind(),
                    error = ?err,
                    duration_ms,
                    "Check failed"
                );
            }
        }

        outcome
    }

    async fn check_status(&self, endpoint: &Endpoint) -> CheckOutcome {
        match self.client.get(&endpoint.url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                CheckOutcome::Status {
                    code,
                    verdict: classify_status(code, endpoint.expected_status),
                }
            }
            Err(err) => CheckOutcome::Error(CheckError::classify(err, self.timeout)),
        }
    }

    /// Like [`check_status`](Self::check_status), but a 200 with a JSON body
    /// is reported as [`CheckOutcome::Healthy`]. A body that is not JSON is
    /// ignored and the status code alone decides.
    async fn check_health(&self, endpoint: &Endpoint) -> CheckOutcome {
        let response = match self.client.get(&endpoint.url).send().await {
            Ok(response) => response,
            Err(err) => return CheckOutcome::Error(CheckError::classify(err, self.timeout)),
        };

        let code = response.status().as_u16();
        if code == 200 {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(err) => return CheckOutcome::Error(CheckError::classify(err, self.timeout)),
            };
            match serde_json::from_slice::<Value>(&body) {
                Ok(payload) => return CheckOutcome::Healthy { payload },
                Err(err) => {
                    tracing::debug!(url = %endpoint.url, error = %err, "Health body is not JSON");
                }
            }
        }

        CheckOutcome::Status {
            code,
            verdict: classify_status(code, endpoint.expected_status),
        }
    }
}
