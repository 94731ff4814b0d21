//! Filesystem checks describing the managed application.
//!
//! Nothing here is cached: every call inspects the disk again so that a build
//! finishing out-of-band is observed by the next status query.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use hakit_config::Config;

const ARTIFACT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::artifact");

/// Answers "is the application built?" and "which version is declared?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDetector {
    build_output_dir: String,
    manifest_file: String,
}

impl ArtifactDetector {
    /// Builds a detector for the given build-output and manifest names.
    #[must_use]
    pub fn new(build_output_dir: impl Into<String>, manifest_file: impl Into<String>) -> Self {
        Self {
            build_output_dir: build_output_dir.into(),
            manifest_file: manifest_file.into(),
        }
    }

    /// Builds a detector from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.build_output_dir(), config.manifest_file())
    }

    /// Path of the build-output subdirectory under `app_root`.
    #[must_use]
    pub fn build_output_path(&self, app_root: &Utf8Path) -> Utf8PathBuf {
        app_root.join(&self.build_output_dir)
    }

    /// Path of the manifest file under `app_root`.
    #[must_use]
    pub fn manifest_path(&self, app_root: &Utf8Path) -> Utf8PathBuf {
        app_root.join(&self.manifest_file)
    }

    /// Returns `true` when the build-output subdirectory exists.
    #[must_use]
    pub fn is_built(&self, app_root: &Utf8Path) -> bool {
        self.build_output_path(app_root).is_dir()
    }

    /// Reads the declared version from the manifest.
    ///
    /// A missing manifest yields `None` silently; any other failure is logged
    /// and also yields `None`.
    #[must_use]
    pub fn read_version(&self, app_root: &Utf8Path) -> Option<String> {
        let path = self.manifest_path(app_root);
        match read_manifest_version(&path) {
            Ok(version) => version,
            Err(ManifestError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                None
            }
            Err(error) => {
                warn!(
                    target: ARTIFACT_TARGET,
                    manifest = %path,
                    %error,
                    "failed to read application version"
                );
                None
            }
        }
    }
}

/// Failures reading the manifest. Never escapes [`ArtifactDetector`].
#[derive(Debug, Error)]
pub(crate) enum ManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse manifest '{path}': {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    version: Option<String>,
}

fn read_manifest_version(path: &Utf8Path) -> Result<Option<String>, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: Manifest =
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(manifest.version)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    struct AppRoot {
        _dir: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn app_root() -> AppRoot {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        AppRoot { _dir: dir, path }
    }

    #[fixture]
    fn detector() -> ArtifactDetector {
        ArtifactDetector::new(".next", "package.json")
    }

    #[rstest]
    fn reports_unbuilt_until_output_directory_appears(
        app_root: AppRoot,
        detector: ArtifactDetector,
    ) {
        assert!(!detector.is_built(&app_root.path));
        fs::create_dir(app_root.path.join(".next")).expect("create build output");
        assert!(detector.is_built(&app_root.path));
    }

    #[rstest]
    fn a_plain_file_is_not_a_build(app_root: AppRoot, detector: ArtifactDetector) {
        fs::write(app_root.path.join(".next"), "").expect("write file");
        assert!(!detector.is_built(&app_root.path));
    }

    #[rstest]
    fn missing_manifest_has_no_version(app_root: AppRoot, detector: ArtifactDetector) {
        assert_eq!(detector.read_version(&app_root.path), None);
    }

    #[rstest]
    #[case::malformed("{ not json")]
    #[case::wrong_type(r#"{"version": 3}"#)]
    #[case::absent_field(r#"{"name": "app"}"#)]
    fn unusable_manifest_has_no_version(
        app_root: AppRoot,
        detector: ArtifactDetector,
        #[case] content: &str,
    ) {
        fs::write(app_root.path.join("package.json"), content).expect("write manifest");
        assert_eq!(detector.read_version(&app_root.path), None);
    }

    #[rstest]
    fn reads_declared_version(app_root: AppRoot, detector: ArtifactDetector) {
        fs::write(app_root.path.join("package.json"), r#"{"version":"1.2.3"}"#)
            .expect("write manifest");
        assert_eq!(
            detector.read_version(&app_root.path).as_deref(),
            Some("1.2.3")
        );
    }

    #[rstest]
    fn version_is_reread_on_every_call(app_root: AppRoot, detector: ArtifactDetector) {
        let manifest = app_root.path.join("package.json");
        fs::write(&manifest, r#"{"version":"1.0.0"}"#).expect("write manifest");
        assert_eq!(detector.read_version(&app_root.path).as_deref(), Some("1.0.0"));
        fs::write(&manifest, r#"{"version":"1.1.0"}"#).expect("rewrite manifest");
        assert_eq!(detector.read_version(&app_root.path).as_deref(), Some("1.1.0"));
    }
}
