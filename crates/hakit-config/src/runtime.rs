//! Files the daemon supervisor keeps while it runs.
//!
//! A Unix socket's directory doubles as the runtime directory. TCP endpoints
//! have no such directory, so the per-user runtime directory is used instead.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::defaults::user_runtime_dir;
use crate::socket::socket_directory;
use crate::{Config, SocketEndpoint};

const LOCK_FILE: &str = "hakitd.lock";
const PID_FILE: &str = "hakitd.pid";
const HEALTH_FILE: &str = "hakitd.health";

/// Lock, pid, and health file locations for one daemon instance.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    dir: PathBuf,
}

impl RuntimePaths {
    /// Resolves the runtime directory for `config` and creates it.
    ///
    /// # Errors
    ///
    /// Fails when a Unix socket path has no directory component or the
    /// directory cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, RuntimePathsError> {
        let dir = runtime_directory(config.daemon_socket())?;
        fs::create_dir_all(&dir).map_err(|source| RuntimePathsError::RuntimeDirectory {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the runtime files.
    #[must_use]
    pub fn runtime_dir(&self) -> &Path {
        &self.dir
    }

    /// Held for the daemon's lifetime to keep a second instance out.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Records the daemon's process id.
    #[must_use]
    pub fn pid_path(&self) -> PathBuf {
        self.dir.join(PID_FILE)
    }

    /// JSON snapshot of the supervisor state (`starting`, `ready`, `stopping`).
    #[must_use]
    pub fn health_path(&self) -> PathBuf {
        self.dir.join(HEALTH_FILE)
    }
}

fn runtime_directory(endpoint: &SocketEndpoint) -> Result<PathBuf, RuntimePathsError> {
    match endpoint {
        SocketEndpoint::Unix { path } => socket_directory(path)
            .map(|dir| dir.as_std_path().to_path_buf())
            .ok_or_else(|| RuntimePathsError::MissingSocketParent {
                path: path.to_string(),
            }),
        SocketEndpoint::Tcp { .. } => Ok(user_runtime_dir().into_std_path_buf()),
    }
}

/// Errors raised while resolving the runtime directory.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    /// The Unix socket path names a bare file.
    #[error("socket path '{path}' has no parent directory")]
    MissingSocketParent {
        /// Configured socket path.
        path: String,
    },
    /// The runtime directory could not be created.
    #[error("failed to prepare runtime directory '{path}': {source}")]
    RuntimeDirectory {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
