//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use camino::Utf8Path;

use hakit_config::Config;

use crate::bootstrap::BootstrapError;
use crate::launcher::LaunchError;
use crate::runner::ProcessError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before the install and build commands run.
    fn build_starting(&self, app_root: &Utf8Path);

    /// Invoked after the build commands succeed.
    fn build_succeeded(&self, app_root: &Utf8Path);

    /// Invoked when an install or build command fails.
    fn build_failed(&self, error: &ProcessError);

    /// Invoked before the launcher prepares the runtime.
    fn launch_starting(&self, app_root: &Utf8Path);

    /// Invoked once the runtime serves requests.
    fn launch_ready(&self, app_root: &Utf8Path);

    /// Invoked when the runtime cannot be prepared.
    fn launch_failed(&self, error: &LaunchError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn build_starting(&self, app_root: &Utf8Path) {
        (**self).build_starting(app_root);
    }

    fn build_succeeded(&self, app_root: &Utf8Path) {
        (**self).build_succeeded(app_root);
    }

    fn build_failed(&self, error: &ProcessError) {
        (**self).build_failed(error);
    }

    fn launch_starting(&self, app_root: &Utf8Path) {
        (**self).launch_starting(app_root);
    }

    fn launch_ready(&self, app_root: &Utf8Path) {
        (**self).launch_ready(app_root);
    }

    fn launch_failed(&self, error: &LaunchError) {
        (**self).launch_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.daemon_socket(),
            app_root = %config.app_root(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn build_starting(&self, app_root: &Utf8Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "build_starting",
            app_root = %app_root,
            "building application"
        );
    }

    fn build_succeeded(&self, app_root: &Utf8Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "build_succeeded",
            app_root = %app_root,
            "application build completed"
        );
    }

    fn build_failed(&self, error: &ProcessError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "build_failed",
            command = error.command().unwrap_or_default(),
            error = %error,
            "application build failed"
        );
    }

    fn launch_starting(&self, app_root: &Utf8Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "launch_starting",
            app_root = %app_root,
            "starting application runtime"
        );
    }

    fn launch_ready(&self, app_root: &Utf8Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "launch_ready",
            app_root = %app_root,
            "application runtime ready"
        );
    }

    fn launch_failed(&self, error: &LaunchError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "launch_failed",
            error = %error,
            error_debug = ?error,
            "application runtime failed to start"
        );
    }
}
