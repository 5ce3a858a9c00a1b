use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_SOURCE_CLI: &str = "VMHOP_SOURCE_CLI";
pub const ENV_DESTINATION_CLI: &str = "VMHOP_DESTINATION_CLI";
pub const ENV_TOOL_TIMEOUT_SECS: &str = "VMHOP_TOOL_TIMEOUT_SECS";
pub const ENV_FAILURE_DETECTION: &str = "VMHOP_FAILURE_DETECTION";
pub const ENV_AVAILABILITY_DOMAIN: &str = "VMHOP_AVAILABILITY_DOMAIN";

/// Default per-call deadline for the external CLIs
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(600);

/// How a finished CLI call is judged to have failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FailureDetection {
    /// Any text on stderr is fatal, regardless of exit status (default).
    #[default]
    AnyStderr,
    /// Only a non-zero exit status is fatal; stderr is logged as a warning.
    ExitStatus,
}

impl FromStr for FailureDetection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stderr" => Ok(Self::AnyStderr),
            "exit-status" | "exit_status" => Ok(Self::ExitStatus),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_FAILURE_DETECTION,
                value: s.to_string(),
                reason: "expected `stderr` or `exit-status`".to_string(),
            }),
        }
    }
}

impl fmt::Display for FailureDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetection::AnyStderr => write!(f, "stderr"),
            FailureDetection::ExitStatus => write!(f, "exit-status"),
        }
    }
}

/// Settings for one migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateConfig {
    /// Program used to describe the source VM
    pub source_cli: String,
    /// Program used to launch the destination instance
    pub destination_cli: String,
    /// Deadline for each external call; `None` waits forever
    pub tool_timeout: Option<Duration>,
    pub failure_detection: FailureDetection,
    /// Passed as `--availability-domain` to the launch call when set
    pub availability_domain: Option<String>,
}

impl MigrateConfig {
    /// Create a configuration with default settings
    ///
    /// Default configuration:
    /// - `az` describes, `oci` launches
    /// - 600 second timeout per call
    /// - any stderr output counts as failure
    pub fn new() -> Self {
        Self {
            source_cli: "az".to_string(),
            destination_cli: "oci".to_string(),
            tool_timeout: Some(DEFAULT_TOOL_TIMEOUT),
            failure_detection: FailureDetection::AnyStderr,
            availability_domain: None,
        }
    }

    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Unset and blank variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::new();

        if let Some(program) = get(ENV_SOURCE_CLI) {
            config.source_cli = program;
        }
        if let Some(program) = get(ENV_DESTINATION_CLI) {
            config.destination_cli = program;
        }
        if let Some(raw) = get(ENV_TOOL_TIMEOUT_SECS) {
            config.tool_timeout = parse_timeout_secs(&raw)?;
        }
        if let Some(raw) = get(ENV_FAILURE_DETECTION) {
            config.failure_detection = raw.parse()?;
        }
        config.availability_domain = get(ENV_AVAILABILITY_DOMAIN);

        config.validate()?;
        Ok(config)
    }

    /// Set the per-call timeout; `None` disables it
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_failure_detection(mut self, detection: FailureDetection) -> Self {
        self.failure_detection = detection;
        self
    }

    #[must_use]
    pub fn with_availability_domain(mut self, domain: impl Into<String>) -> Self {
        self.availability_domain = Some(domain.into());
        self
    }

    /// Override the programs used for both calls
    #[must_use]
    pub fn with_programs(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source_cli = source.into();
        self.destination_cli = destination.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_cli.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: ENV_SOURCE_CLI,
                value: self.source_cli.clone(),
                reason: "program name must not be empty".to_string(),
            });
        }

        if self.destination_cli.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: ENV_DESTINATION_CLI,
                value: self.destination_cli.clone(),
                reason: "program name must not be empty".to_string(),
            });
        }

        if let Some(domain) = &self.availability_domain {
            if domain.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_AVAILABILITY_DOMAIN,
                    value: domain.clone(),
                    reason: "availability domain must not be blank".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a timeout in whole seconds; `0` means no timeout.
pub fn parse_timeout_secs(raw: &str) -> Result<Option<Duration>, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: ENV_TOOL_TIMEOUT_SECS,
        value: raw.to_string(),
        reason: "expected a whole number of seconds".to_string(),
    })?;

    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
