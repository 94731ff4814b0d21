//! Temporary application root with helpers for staging on-disk state.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::artifact::ArtifactDetector;

pub const BUILD_OUTPUT_DIR: &str = ".next";
pub const MANIFEST_FILE: &str = "package.json";
const CONFIG_PAGE: &str = "config.html";

/// Application directory removed when dropped.
pub struct TempAppRoot {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl TempAppRoot {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create application root");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("temporary application root was not valid UTF-8");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Detector matching the layout this root stages.
    pub fn detector(&self) -> ArtifactDetector {
        ArtifactDetector::new(BUILD_OUTPUT_DIR, MANIFEST_FILE)
    }

    pub fn build_output(&self) -> Utf8PathBuf {
        self.path.join(BUILD_OUTPUT_DIR)
    }

    pub fn mark_built(&self) {
        fs::create_dir_all(self.build_output()).expect("failed to create build output");
    }

    pub fn write_manifest(&self, contents: &str) {
        fs::write(self.path.join(MANIFEST_FILE), contents).expect("failed to write manifest");
    }

    /// Config page path; the file only exists after [`Self::write_config_page`].
    pub fn config_page(&self) -> Utf8PathBuf {
        self.path.join(CONFIG_PAGE)
    }

    pub fn write_config_page(&self, html: &str) {
        fs::write(self.config_page(), html).expect("failed to write config page");
    }
}

impl Default for TempAppRoot {
    fn default() -> Self {
        Self::new()
    }
}
