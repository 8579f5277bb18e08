//! External tool invocation
//!
//! Every platform tool is run through a [`CommandRunner`] so strategies and
//! parsers can be exercised against canned output. Each invocation is bounded
//! by a timeout; the system runner kills the child when the wait is abandoned.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tracing::trace;

use crate::error::CommandError;

/// How long a `which` lookup may take
const WHICH_TIMEOUT: Duration = Duration::from_secs(5);

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external programs and captures their output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    async fn run(&self, command: &ToolCommand) -> Result<CommandOutput, CommandError>;

    /// Run a command, giving up after `timeout`
    async fn run_with_timeout(
        &self,
        command: &ToolCommand,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        match tokio::time::timeout(timeout, self.run(command)).await {
            Ok(result) => result,
            Err(_) => Err(CommandError::Timeout {
                program: command.program.clone(),
                timeout,
            }),
        }
    }

    /// Check whether a tool is installed by asking `which`
    async fn is_available(&self, tool: &str) -> bool {
        let command = ToolCommand::new("which", [tool]);
        match self.run_with_timeout(&command, WHICH_TIMEOUT).await {
            Ok(output) => output.success(),
            Err(e) => {
                trace!(tool = %tool, error = %e, "Tool lookup failed");
                false
            }
        }
    }
}

/// Runs commands as child processes of this daemon
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &ToolCommand) -> Result<CommandOutput, CommandError> {
        trace!(command = %command, "Running command");

        let output = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => CommandError::NotFound(command.program.clone()),
                _ => CommandError::Spawn {
                    program: command.program.clone(),
                    source: e,
                },
            })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
