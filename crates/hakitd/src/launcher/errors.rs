//! Errors raised while preparing the application runtime.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::runner::ProcessError;

/// Failure to bring the application runtime up.
///
/// Cloneable so a single failure can be reported to every caller that joined
/// the same start sequence.
#[derive(Debug, Clone, Error)]
pub enum LaunchError {
    /// The configured start command could not be parsed.
    #[error("invalid start command: {source}")]
    Command {
        /// Parse failure.
        #[source]
        source: ProcessError,
    },
    /// The start command could not be spawned.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The application exited before it accepted connections.
    #[error("'{command}' exited before becoming ready (status: {code:?})")]
    Exited {
        /// Rendered command line.
        command: String,
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
    },
    /// The application did not accept connections within its time budget.
    #[error("application did not listen on port {port} within {timeout:?}")]
    NotReady {
        /// Port that was polled.
        port: u16,
        /// Budget that was exceeded.
        timeout: Duration,
    },
    /// Polling the child for its exit status failed.
    #[error("failed to poll '{command}': {source}")]
    Wait {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The forwarding HTTP client could not be built.
    #[error("failed to build forwarding client: {source}")]
    Client {
        /// Underlying client error.
        #[source]
        source: Arc<reqwest::Error>,
    },
}
