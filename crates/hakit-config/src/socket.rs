//! Where `hakitd` listens for JSONL requests.
//!
//! Endpoints are written either as URLs (`unix:///run/hakit/hakitd.sock`,
//! `tcp://127.0.0.1:9780`) or as a bare absolute path, which is read as a
//! Unix socket.

use std::fmt;
use std::fs::DirBuilder;
use std::io;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Socket the daemon binds for its routing boundary.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket at `path`.
    Unix {
        /// Socket file location.
        path: Utf8PathBuf,
    },
    /// TCP listener on `host:port`.
    Tcp {
        /// Interface name or address to bind.
        host: String,
        /// Listening port.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// TCP endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Socket file path, for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_path()),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the directory that will hold a Unix socket, readable by the
    /// current user only. TCP endpoints need no preparation.
    ///
    /// # Errors
    ///
    /// Fails when the socket path has no parent or the directory cannot be
    /// created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let directory =
            socket_directory(path).ok_or_else(|| SocketPreparationError::MissingParent {
                path: path.to_owned(),
            })?;
        create_private_directory(directory).map_err(|source| {
            SocketPreparationError::CreateDirectory {
                path: directory.to_owned(),
                source,
            }
        })
    }
}

/// Directory containing the socket file, if the path names one.
pub(crate) fn socket_directory(path: &Utf8Path) -> Option<&Utf8Path> {
    path.parent().filter(|parent| !parent.as_str().is_empty())
}

fn create_private_directory(path: &Utf8Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(f, "unix://{path}"),
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.starts_with('/') {
            return Ok(Self::unix(input));
        }
        let url = Url::parse(input).map_err(|source| SocketParseError::Url {
            input: input.to_owned(),
            source,
        })?;
        let missing = |part: &'static str| SocketParseError::Missing {
            input: input.to_owned(),
            part,
        };
        match url.scheme() {
            "unix" if url.path().is_empty() => Err(missing("socket path")),
            "unix" => Ok(Self::unix(url.path())),
            "tcp" => {
                let host = url.host_str().ok_or_else(|| missing("host"))?;
                let port = url.port().ok_or_else(|| missing("port"))?;
                Ok(Self::tcp(host, port))
            }
            scheme => Err(SocketParseError::Scheme {
                input: input.to_owned(),
                scheme: scheme.to_owned(),
            }),
        }
    }
}

/// Errors raised when text does not describe a [`SocketEndpoint`].
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Only `unix` and `tcp` are understood.
    #[error("'{input}' uses unsupported scheme '{scheme}'; expected unix or tcp")]
    Scheme {
        /// Text as configured.
        input: String,
        /// Scheme that was found.
        scheme: String,
    },
    /// A component the transport needs was absent.
    #[error("'{input}' is missing a {part}")]
    Missing {
        /// Text as configured.
        input: String,
        /// Name of the absent component.
        part: &'static str,
    },
    /// Neither an absolute path nor a URL.
    #[error("'{input}' is not a socket URL: {source}")]
    Url {
        /// Text as configured.
        input: String,
        /// URL parser diagnostic.
        #[source]
        source: url::ParseError,
    },
}

/// Errors raised while creating the socket directory.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path names a bare file.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Configured socket path.
        path: Utf8PathBuf,
    },
    /// The parent directory could not be created.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that was being created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
