//! Observable lifecycle state and status snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the application is in its build-and-start sequence.
///
/// `Failed` is not terminal: a new start trigger re-enters the sequence. There
/// is no transition out of `Running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationState {
    /// No start sequence has run yet.
    NotBuilt,
    /// Install and build commands are running.
    Building,
    /// The launcher is preparing the runtime.
    Starting,
    /// The runtime is up and serving requests.
    Running,
    /// The last start sequence failed with the given reason.
    Failed(String),
}

impl ApplicationState {
    /// Returns `true` once the runtime has been prepared.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns `true` while a build or launch is underway.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Building | Self::Starting)
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBuilt => formatter.write_str("not_built"),
            Self::Building => formatter.write_str("building"),
            Self::Starting => formatter.write_str("starting"),
            Self::Running => formatter.write_str("running"),
            Self::Failed(reason) => write!(formatter, "failed: {reason}"),
        }
    }
}

/// Point-in-time answer to a status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Version declared by the manifest, if readable.
    pub version: Option<String>,
    /// Whether the build output exists.
    pub built: bool,
    /// Whether the runtime is serving requests.
    pub running: bool,
}
