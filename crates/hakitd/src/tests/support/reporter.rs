//! Test double for [`HealthReporter`] that records structured events for assertions.
//!
//! The recorder captures bootstrap, build, and launch telemetry so unit and
//! behaviour tests can validate the observable event sequence.

use std::sync::Mutex;

use camino::Utf8Path;

use hakit_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::launcher::LaunchError;
use crate::runner::ProcessError;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    BuildStarting,
    BuildSucceeded,
    BuildFailed(String),
    LaunchStarting,
    LaunchReady,
    LaunchFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn build_starting(&self, _app_root: &Utf8Path) {
        self.record(HealthEvent::BuildStarting);
    }

    fn build_succeeded(&self, _app_root: &Utf8Path) {
        self.record(HealthEvent::BuildSucceeded);
    }

    fn build_failed(&self, error: &ProcessError) {
        self.record(HealthEvent::BuildFailed(error.to_string()));
    }

    fn launch_starting(&self, _app_root: &Utf8Path) {
        self.record(HealthEvent::LaunchStarting);
    }

    fn launch_ready(&self, _app_root: &Utf8Path) {
        self.record(HealthEvent::LaunchReady);
    }

    fn launch_failed(&self, error: &LaunchError) {
        self.record(HealthEvent::LaunchFailed(error.to_string()));
    }
}
