//! Configuration loading and constants.
//!
//! Target URLs, auth mode, and timeout come from (highest priority first) the
//! command line, the environment, an optional TOML file, and the built-in
//! defaults below. `SmokeConfig` is the resolved, immutable result.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Target Defaults
// =============================================================================

/// API base URL when `API_URL` is not set
pub const DEFAULT_API_URL: &str = "https://api.com.caramelme.com";

/// Dashboard base URL when `DASHBOARD_URL` is not set
pub const DEFAULT_DASHBOARD_URL: &str = "https://dashboard.com.caramelme.com";

/// Auth mode that enables the workspace listing check
pub const MULTI_TENANT_MODE: &str = "multi-tenant";

/// Auth mode when `AUTH_MODE` is not set
pub const DEFAULT_AUTH_MODE: &str = MULTI_TENANT_MODE;

// =============================================================================
// HTTP Check Constants
// =============================================================================

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Status code a check expects unless told otherwise
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

/// Status codes that pass a check regardless of the expected status
pub const ACCEPTED_STATUSES: [u16; 4] = [200, 301, 302, 304];

/// Redirect hops followed before giving up
pub const MAX_REDIRECTS: usize = 10;

/// Health endpoint path, relative to the API base URL
pub const HEALTH_PATH: &str = "/health";

/// Workspace listing path, relative to the API base URL
pub const WORKSPACES_PATH: &str = "/api/workspaces";

pub const USER_AGENT: &str = formatcp!("smokecheck/{}", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Logging Defaults
// =============================================================================

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "smokecheck=warn";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Contents of the optional TOML config file. Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub target: TargetSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[target]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    pub api_url: Option<String>,
    pub dashboard_url: Option<String>,
    pub auth_mode: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// "text" or "json"
    pub format: Option<String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Values taken from the command line or environment. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub dashboard_url: Option<String>,
    pub auth_mode: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub log_format: Option<String>,
}

/// Log output format for the diagnostic stream on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Validation(format!(
                "Unknown log format '{}', expected 'text' or 'json'",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

/// Resolved configuration for one smoke run.
#[derive(Debug, Clone)]
pub struct SmokeConfig {
    pub api_url: String,
    pub dashboard_url: String,
    pub auth_mode: String,
    /// Limit for the connect phase and for each socket read
    pub timeout: Duration,
    pub logging: LoggingConfig,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            auth_mode: DEFAULT_AUTH_MODE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            logging: LoggingConfig::default(),
        }
    }
}

impl SmokeConfig {
    /// Merge overrides over the file over the defaults.
    pub fn resolve(overrides: Overrides, file: Option<FileConfig>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let target = file.target;

        let timeout_seconds = overrides
            .timeout_seconds
            .or(target.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be at least 1 second".to_string(),
            ));
        }

        let format = overrides
            .log_format
            .or(file.logging.format)
            .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string())
            .parse()?;

        Ok(Self {
            api_url: overrides
                .api_url
                .or(target.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            dashboard_url: overrides
                .dashboard_url
                .or(target.dashboard_url)
                .unwrap_or_else(|| DEFAULT_DASHBOARD_URL.to_string()),
            auth_mode: overrides
                .auth_mode
                .or(target.auth_mode)
                .unwrap_or_else(|| DEFAULT_AUTH_MODE.to_string()),
            timeout: Duration::from_secs(timeout_seconds),
            logging: LoggingConfig { format },
        })
    }

    /// True only for the exact `multi-tenant` literal.
    pub fn is_multi_tenant(&self) -> bool {
        self.auth_mode == MULTI_TENANT_MODE
    }

    pub fn health_url(&self) -> String {
        join_url(&self.api_url, HEALTH_PATH)
    }

    /// The API base URL exactly as configured.
    pub fn api_root_url(&self) -> String {
        self.api_url.clone()
    }

    pub fn dashboard_root_url(&self) -> String {
        self.dashboard_url.clone()
    }

    pub fn workspaces_url(&self) -> String {
        join_url(&self.api_url, WORKSPACES_PATH)
    }
}

/// Join a base URL and an absolute path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Validation(String),
}
