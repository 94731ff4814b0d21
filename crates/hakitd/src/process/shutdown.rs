//! Blocks the supervising thread until the daemon is asked to stop.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

const STOP_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Something the launch sequence can park on until shutdown is due.
pub(crate) trait ShutdownSignal: Send + Sync {
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failure while waiting for a stop signal.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("cannot register stop signal handlers: {source}")]
    Install {
        /// Underlying registration error.
        #[source]
        source: io::Error,
    },
}

/// Waits for the first of SIGTERM, SIGINT, SIGQUIT, or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals =
            Signals::new(STOP_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        let received = signals.forever().next();
        info!(
            target: PROCESS_TARGET,
            signal = received,
            "stopping hakitd"
        );
        Ok(())
    }
}
