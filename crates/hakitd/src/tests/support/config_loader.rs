//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use hakit_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

use super::app_root::{BUILD_OUTPUT_DIR, MANIFEST_FILE};

/// Loader that confines the socket, runtime files, and application root to a
/// temporary directory.
///
/// Clones share the directory, which lives until the last clone is dropped.
#[derive(Clone)]
pub struct TestConfigLoader {
    dir: Arc<TempDir>,
    autostart: bool,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        Self {
            dir: Arc::new(dir),
            autostart: false,
        }
    }

    /// Enables the boot-time start of an already-built application.
    #[must_use]
    pub fn with_autostart(mut self) -> Self {
        self.autostart = true;
        self
    }

    /// Directory holding the socket and runtime artefacts.
    pub fn runtime_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Application root configured by this loader.
    pub fn app_root(&self) -> Utf8PathBuf {
        self.utf8_dir().join("app")
    }

    fn utf8_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.runtime_dir())
            .expect("temporary directory was not valid UTF-8")
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let dir = self.utf8_dir();
        Ok(Config {
            daemon_socket: SocketEndpoint::unix(dir.join("hakitd.sock")),
            app_root: self.app_root(),
            config_page: dir.join("config.html"),
            build_output_dir: BUILD_OUTPUT_DIR.to_owned(),
            manifest_file: MANIFEST_FILE.to_owned(),
            autostart: self.autostart,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("hakitd"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
