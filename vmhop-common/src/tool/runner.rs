use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::FailureDetection;
use crate::error::ToolError;
use crate::tool::Invocation;

/// Everything a finished CLI call left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// Successful output carrying `stdout`
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Decide whether the call failed under the given detection policy
    pub fn check(&self, program: &str, detection: FailureDetection) -> Result<(), ToolError> {
        let stderr = self.stderr_text();

        match detection {
            FailureDetection::AnyStderr => {
                if !stderr.is_empty() {
                    return Err(ToolError::Stderr {
                        program: program.to_string(),
                        stderr,
                    });
                }
            }
            FailureDetection::ExitStatus => {
                if self.exit_code != Some(0) {
                    return Err(ToolError::ExitStatus {
                        program: program.to_string(),
                        code: self.exit_code,
                        stderr,
                    });
                }
                if !stderr.is_empty() {
                    warn!("{} succeeded but wrote to stderr: {}", program, stderr);
                }
            }
        }

        Ok(())
    }

    /// Parse stdout as a JSON document
    pub fn parse_json<T: DeserializeOwned>(&self, program: &str) -> Result<T, ToolError> {
        serde_json::from_slice(&self.stdout).map_err(|source| ToolError::MalformedOutput {
            program: program.to_string(),
            source,
        })
    }
}

/// Runs external CLI invocations
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError>;
}

/// Runs invocations as child processes and waits for them to exit
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// `None` waits for the child indefinitely
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    #[tracing::instrument(name = "tool.run", skip(self, invocation), fields(program = %invocation.program))]
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        debug!("Executing: {}", invocation);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must not leave the child running
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| ToolError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("{} timed out after {:?}, killed", invocation.program, limit);
                    return Err(ToolError::Timeout {
                        program: invocation.program.clone(),
                        timeout: limit,
                    });
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|source| ToolError::Io {
            program: invocation.program.clone(),
            source,
        })?;

        debug!(
            "{} exited with {:?} ({} bytes stdout, {} bytes stderr)",
            invocation.program,
            output.status.code(),
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
