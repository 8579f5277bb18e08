//! Error types for discovery strategies and tool invocation

use std::time::Duration;
use thiserror::Error;

/// Failure to run an external tool
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0} is not installed")]
    NotFound(String),
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Reason a discovery strategy produced no devices
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("{0} is not available")]
    ToolUnavailable(String),
    #[error("Elevated privileges required")]
    InsufficientPrivilege,
    #[error("{tool} failed: {reason}")]
    ExecutionFailure { tool: String, reason: String },
    #[error("No default network interface found")]
    InterfaceNotFound,
}

impl From<CommandError> for DiscoveryError {
    fn from(e: CommandError) -> Self {
        let reason = e.to_string();
        match e {
            CommandError::NotFound(tool) => DiscoveryError::ToolUnavailable(tool),
            CommandError::Spawn { program, .. } | CommandError::Timeout { program, .. } => {
                DiscoveryError::ExecutionFailure { tool: program, reason }
            }
        }
    }
}
