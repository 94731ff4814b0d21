//! Errors that stop the daemon from starting or shutting down cleanly.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTimeError;

use nix::errno::Errno;
use ortho_config::OrthoError;
use thiserror::Error;

use hakit_config::{RuntimePathsError, SocketPreparationError};

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Failure raised by [`run_daemon`](crate::run_daemon).
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration could not be loaded.
    #[error("cannot load configuration: {source}")]
    Config {
        /// Loader error.
        #[from]
        source: Arc<OrthoError>,
    },
    /// The socket directory could not be prepared.
    #[error("cannot prepare the daemon socket: {source}")]
    Socket {
        /// Preparation failure.
        #[from]
        source: SocketPreparationError,
    },
    /// The runtime directory could not be resolved or created.
    #[error("cannot prepare runtime paths: {source}")]
    RuntimePaths {
        /// Resolution failure.
        #[from]
        source: RuntimePathsError,
    },
    /// Another live daemon owns the lock file.
    #[error("hakitd is already running as pid {pid}")]
    AlreadyRunning {
        /// Process id recorded by the running daemon.
        pid: u32,
    },
    /// Reading or writing one of the lock, pid, or health files failed.
    #[error("cannot {action} '{path}': {source}")]
    RuntimeFile {
        /// Operation that failed.
        action: RuntimeFileAction,
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The health snapshot could not be serialised.
    #[error("cannot encode the health snapshot: {source}")]
    HealthEncode {
        /// Serialisation error.
        #[from]
        source: serde_json::Error,
    },
    /// The health snapshot timestamp could not be taken.
    #[error("system clock is before the unix epoch: {source}")]
    Clock {
        /// Clock error.
        #[source]
        source: SystemTimeError,
    },
    /// Signal 0 to the pid recorded by a previous daemon failed unexpectedly.
    #[error("cannot check process {pid}: {source}")]
    CheckProcess {
        /// Process id that was checked.
        pid: u32,
        /// Error returned by `kill`.
        #[source]
        source: Errno,
    },
    /// Health was published before the pid file existed.
    #[error("pid must be written before updating health state")]
    MissingPid,
    /// Stop signal handlers could not be installed.
    #[error("cannot wait for a shutdown signal: {source}")]
    Shutdown {
        /// Signal registration failure.
        #[from]
        source: ShutdownError,
    },
    /// Bootstrap failed after the runtime files were claimed.
    #[error("bootstrap failed: {source}")]
    Bootstrap {
        /// Bootstrap failure.
        #[from]
        source: BootstrapError,
    },
    /// The socket listener could not be bound or stopped cleanly.
    #[error("socket listener failed: {source}")]
    Listener {
        /// Listener failure.
        #[from]
        source: ListenerError,
    },
}

/// Which runtime-file operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFileAction {
    /// Creating the exclusive lock file.
    CreateLock,
    /// Removing a lock or pid file left by a dead daemon.
    RemoveStale,
    /// Writing the pid file.
    WritePid,
    /// Writing the health snapshot.
    WriteHealth,
}

impl fmt::Display for RuntimeFileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateLock => "create lock file",
            Self::RemoveStale => "remove stale file",
            Self::WritePid => "write pid file",
            Self::WriteHealth => "write health snapshot",
        })
    }
}
