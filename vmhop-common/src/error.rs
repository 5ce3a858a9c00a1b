use std::time::Duration;

use thiserror::Error;

use crate::migration::lifecycle::InvalidTransition;

/// Failure of a single external CLI call
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started at all
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child or collecting its output failed
    #[error("I/O error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child did not exit before the deadline and was killed
    #[error("`{program}` did not finish within {} seconds and was killed", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    /// The child wrote to stderr
    #[error("`{program}` reported an error: {stderr}")]
    Stderr { program: String, stderr: String },

    /// The child exited unsuccessfully
    #[error("`{program}` exited with {}: {stderr}", describe_exit(.code.as_ref()))]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// stdout was not the JSON document we expected
    #[error("`{program}` produced malformed output: {source}")]
    MalformedOutput {
        program: String,
        #[source]
        source: serde_json::Error,
    },
}

fn describe_exit(code: Option<&i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

/// A describe result that lacks one of the fields a launch needs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("source descriptor is missing `{0}`")]
    MissingField(&'static str),

    #[error("source descriptor field `{0}` is empty")]
    EmptyField(&'static str),
}

/// Terminal failure of a migration run
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("could not describe source VM: {0}")]
    Describe(#[source] ToolError),

    #[error("could not extract instance settings: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("could not create destination instance: {0}")]
    Create(#[source] ToolError),

    #[error(transparent)]
    Lifecycle(#[from] InvalidTransition),
}

/// Rejected configuration value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
