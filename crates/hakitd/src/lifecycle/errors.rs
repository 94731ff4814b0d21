//! Errors reported by a start sequence.

use thiserror::Error;

use crate::launcher::LaunchError;
use crate::runner::ProcessError;

/// Why a start sequence failed.
///
/// Cloneable because every caller that joined the sequence receives the same
/// outcome.
#[derive(Debug, Clone, Error)]
pub enum StartError {
    /// An install or build command failed.
    #[error("build failed: {0}")]
    Build(#[source] ProcessError),
    /// The runtime could not be prepared.
    #[error("launch failed: {0}")]
    Launch(#[source] LaunchError),
    /// The sequence unwound before reporting an outcome.
    #[error("start sequence was interrupted")]
    Interrupted,
}

impl From<ProcessError> for StartError {
    fn from(source: ProcessError) -> Self {
        Self::Build(source)
    }
}

impl From<LaunchError> for StartError {
    fn from(source: LaunchError) -> Self {
        Self::Launch(source)
    }
}
