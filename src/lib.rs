//! smokecheck - deployment smoke tests
//!
//! Probes a deployed application's public endpoints (API health, API root,
//! dashboard and, in multi-tenant mode, the workspace listing) and reports
//! pass/fail on the console.

pub mod checker;
pub mod config;
pub mod error;
pub mod report;
pub mod runner;

pub use checker::{CheckOutcome, Endpoint, EndpointChecker};
pub use config::SmokeConfig;
pub use error::{AppError, CheckError};
pub use runner::{run, CheckResult, RunSummary};
