use std::io;
use std::time::Duration;

use crate::config::ConfigError;

/// Why a single endpoint check could not produce a status code.
///
/// The `Display` text is what the report prints on the failure line, so keep
/// it short and human-facing.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Connection failed")]
    Connection(#[source] reqwest::Error),

    #[error("Timeout after {}s", .after.as_secs_f64())]
    Timeout {
        after: Duration,
        #[source]
        source: reqwest::Error,
    },

    #[error("Error: {0}")]
    Request(#[source] reqwest::Error),
}

impl CheckError {
    /// Sorts a transport error into the failure taxonomy.
    ///
    /// Connect errors are tested first: a connect that stalls past the
    /// deadline is a connection failure, and only a stalled read is a timeout.
    pub fn classify(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_connect() {
            CheckError::Connection(err)
        } else if err.is_timeout() {
            CheckError::Timeout {
                after: timeout,
                source: err,
            }
        } else {
            CheckError::Request(err)
        }
    }

    /// Short machine-friendly tag used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Connection(_) => "connection",
            CheckError::Timeout { .. } => "timeout",
            CheckError::Request(_) => "request",
        }
    }
}

/// Errors that stop the run before or outside of the endpoint checks.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
}
