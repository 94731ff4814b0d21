//! Built-in configuration defaults.

use std::env;

use camino::Utf8PathBuf;
use dirs::runtime_dir;

#[cfg(unix)]
use libc::geteuid;

use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9780;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default application root, relative to the daemon's working directory.
pub const DEFAULT_APP_ROOT: &str = "app";

/// Default static page served on the config route.
pub const DEFAULT_CONFIG_PAGE: &str = "index.html";

/// Subdirectory written by the application framework's build step.
pub const DEFAULT_BUILD_OUTPUT_DIR: &str = ".next";

/// Manifest file declaring the application version.
pub const DEFAULT_MANIFEST_FILE: &str = "package.json";

/// Default dependency install command.
pub const DEFAULT_INSTALL_COMMAND: &str = "npm ci";

/// Default build command.
pub const DEFAULT_BUILD_COMMAND: &str = "npm run build";

/// Default command serving the built application.
pub const DEFAULT_START_COMMAND: &str = "npm run start";

/// Default loopback port for the served application.
pub const DEFAULT_UPSTREAM_PORT: u16 = 3000;

/// Default per-command build timeout. Dependency installs on slow links
/// routinely take several minutes.
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 900;

/// Default readiness timeout for the served application.
pub const DEFAULT_LAUNCH_TIMEOUT_SECS: u64 = 60;

/// Default log filter expression used by the daemon.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default application root.
#[must_use]
pub fn default_app_root() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_APP_ROOT)
}

/// Default config page path.
#[must_use]
pub fn default_config_page() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_CONFIG_PAGE)
}

/// Default build-output subdirectory name.
#[must_use]
pub fn default_build_output_dir() -> String {
    DEFAULT_BUILD_OUTPUT_DIR.to_owned()
}

/// Default manifest file name.
#[must_use]
pub fn default_manifest_file() -> String {
    DEFAULT_MANIFEST_FILE.to_owned()
}

/// Default install command line.
#[must_use]
pub fn default_install_command() -> String {
    DEFAULT_INSTALL_COMMAND.to_owned()
}

/// Default build command line.
#[must_use]
pub fn default_build_command() -> String {
    DEFAULT_BUILD_COMMAND.to_owned()
}

/// Default serve command line.
#[must_use]
pub fn default_start_command() -> String {
    DEFAULT_START_COMMAND.to_owned()
}

/// Socket file name inside the runtime directory.
pub(crate) const SOCKET_FILE: &str = "hakitd.sock";

/// Computes the default socket endpoint for the daemon.
///
/// On Unix this is `hakitd.sock` inside [`user_runtime_dir`]; elsewhere the
/// daemon falls back to a loopback TCP port.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    #[cfg(unix)]
    {
        SocketEndpoint::unix(user_runtime_dir().join(SOCKET_FILE))
    }
    #[cfg(not(unix))]
    {
        SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
    }
}

/// Per-user directory for the socket and runtime artefacts.
///
/// Prefers `$XDG_RUNTIME_DIR/hakit`. Without one, the temporary directory is
/// namespaced by effective uid so users on a shared host do not collide.
pub(crate) fn user_runtime_dir() -> Utf8PathBuf {
    runtime_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .map_or_else(
            || temp_base().join("hakit").join(uid_namespace()),
            |base| base.join("hakit"),
        )
}

fn temp_base() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn uid_namespace() -> String {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn uid_namespace() -> String {
    String::from("shared")
}
