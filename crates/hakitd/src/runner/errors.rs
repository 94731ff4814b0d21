//! Errors raised while running external build commands.
//!
//! I/O errors are wrapped in `Arc` so a failure can be handed to every caller
//! waiting on the same start sequence.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single external command.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The configured command line contained no program.
    #[error("command line '{line}' names no program")]
    EmptyCommand {
        /// Raw configured command line.
        line: String,
    },
    /// The program could not be started.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The program ran and exited unsuccessfully.
    #[error("'{command}' {}", describe_exit(.code))]
    Exit {
        /// Rendered command line.
        command: String,
        /// Exit code, absent when the process was killed by a signal.
        code: Option<i32>,
    },
    /// The program outlived its time budget and was killed.
    #[error("'{command}' timed out after {timeout:?}")]
    Timeout {
        /// Rendered command line.
        command: String,
        /// Budget that was exceeded.
        timeout: Duration,
    },
    /// Polling the child for its exit status failed.
    #[error("failed to wait for '{command}': {source}")]
    Wait {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl ProcessError {
    /// Rendered command line the error refers to, when there is one.
    #[must_use]
    pub const fn command(&self) -> Option<&str> {
        match self {
            Self::EmptyCommand { .. } => None,
            Self::Spawn { command, .. }
            | Self::Exit { command, .. }
            | Self::Timeout { command, .. }
            | Self::Wait { command, .. } => Some(command.as_str()),
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(
        || String::from("was terminated by a signal"),
        |status| format!("exited with status {status}"),
    )
}
