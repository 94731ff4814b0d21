//! Shared configuration for the hakit application host.
//!
//! The daemon and its tests agree on a single [`Config`] type assembled by
//! `ortho_config` from layered sources: built-in defaults, an optional TOML
//! file, `HAKIT_*` environment variables, and command-line flags. Later layers
//! override earlier ones.
//!
//! Besides the transport and logging settings, the configuration names the
//! managed application: where its source lives, which subdirectory marks a
//! finished build, and which external commands install, build, and serve it.

mod defaults;
mod logging;
mod runtime;
mod socket;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

pub use ortho_config::{OrthoConfig, OrthoError};

pub use defaults::{
    DEFAULT_APP_ROOT, DEFAULT_BUILD_COMMAND, DEFAULT_BUILD_OUTPUT_DIR,
    DEFAULT_BUILD_TIMEOUT_SECS, DEFAULT_CONFIG_PAGE, DEFAULT_INSTALL_COMMAND,
    DEFAULT_LAUNCH_TIMEOUT_SECS, DEFAULT_LOG_FILTER, DEFAULT_MANIFEST_FILE,
    DEFAULT_START_COMMAND, DEFAULT_TCP_PORT, DEFAULT_UPSTREAM_PORT, default_app_root,
    default_build_command, default_build_output_dir, default_config_page,
    default_install_command, default_log_filter, default_log_filter_string,
    default_log_format, default_manifest_file, default_socket_endpoint, default_start_command,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use runtime::{RuntimePaths, RuntimePathsError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration for the application host daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "HAKIT")]
pub struct Config {
    /// Endpoint the daemon listens on for status and start requests.
    #[ortho_config(default = default_socket_endpoint())]
    pub daemon_socket: SocketEndpoint,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Directory holding the managed application's source and build output.
    #[ortho_config(default = default_app_root())]
    pub app_root: Utf8PathBuf,
    /// Static page served on the config route.
    #[ortho_config(default = default_config_page())]
    pub config_page: Utf8PathBuf,
    /// Subdirectory of `app_root` whose presence means "built".
    #[ortho_config(default = default_build_output_dir())]
    pub build_output_dir: String,
    /// Manifest file inside `app_root` carrying the `version` field.
    #[ortho_config(default = default_manifest_file())]
    pub manifest_file: String,
    /// Command installing the application's dependencies.
    #[ortho_config(default = default_install_command())]
    pub install_command: String,
    /// Command compiling the application.
    #[ortho_config(default = default_build_command())]
    pub build_command: String,
    /// Command serving the compiled application.
    #[ortho_config(default = default_start_command())]
    pub start_command: String,
    /// Loopback port the served application listens on.
    #[ortho_config(default = DEFAULT_UPSTREAM_PORT)]
    pub upstream_port: u16,
    /// Upper bound, in seconds, for each install or build command.
    #[ortho_config(default = DEFAULT_BUILD_TIMEOUT_SECS)]
    pub build_timeout_secs: u64,
    /// Upper bound, in seconds, for the served application to accept connections.
    #[ortho_config(default = DEFAULT_LAUNCH_TIMEOUT_SECS)]
    pub launch_timeout_secs: u64,
    /// Start the application during boot when it is already built.
    #[ortho_config(default = true)]
    pub autostart: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            app_root: default_app_root(),
            config_page: default_config_page(),
            build_output_dir: default_build_output_dir(),
            manifest_file: default_manifest_file(),
            install_command: default_install_command(),
            build_command: default_build_command(),
            start_command: default_start_command(),
            upstream_port: DEFAULT_UPSTREAM_PORT,
            build_timeout_secs: DEFAULT_BUILD_TIMEOUT_SECS,
            launch_timeout_secs: DEFAULT_LAUNCH_TIMEOUT_SECS,
            autostart: true,
        }
    }
}

impl Config {
    /// Endpoint the daemon binds.
    #[must_use]
    pub const fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Log filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Application root directory.
    #[must_use]
    pub fn app_root(&self) -> &Utf8Path {
        self.app_root.as_path()
    }

    /// Page served on the config route.
    #[must_use]
    pub fn config_page(&self) -> &Utf8Path {
        self.config_page.as_path()
    }

    /// Name of the build-output subdirectory.
    #[must_use]
    pub const fn build_output_dir(&self) -> &str {
        self.build_output_dir.as_str()
    }

    /// Name of the manifest file.
    #[must_use]
    pub const fn manifest_file(&self) -> &str {
        self.manifest_file.as_str()
    }

    /// Dependency install command line.
    #[must_use]
    pub const fn install_command(&self) -> &str {
        self.install_command.as_str()
    }

    /// Build command line.
    #[must_use]
    pub const fn build_command(&self) -> &str {
        self.build_command.as_str()
    }

    /// Serve command line.
    #[must_use]
    pub const fn start_command(&self) -> &str {
        self.start_command.as_str()
    }

    /// Port the served application listens on.
    #[must_use]
    pub const fn upstream_port(&self) -> u16 {
        self.upstream_port
    }

    /// Timeout applied to each install or build command.
    #[must_use]
    pub const fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    /// Timeout applied while waiting for the served application.
    #[must_use]
    pub const fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }

    /// Whether an already-built application starts during boot.
    #[must_use]
    pub const fn autostart(&self) -> bool {
        self.autostart
    }
}
