//! Build-then-start orchestration with single-flight serialisation.

use std::fs;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use hakit_config::Config;

use crate::artifact::ArtifactDetector;
use crate::dispatch::RequestHandler;
use crate::health::HealthReporter;
use crate::launcher::ApplicationLauncher;
use crate::runner::{CommandLine, ProcessError, ProcessRunner};

use super::LIFECYCLE_TARGET;
use super::errors::StartError;
use super::state::{ApplicationState, StatusSnapshot};

/// Environment handed to the build command only.
const BUILD_ENV: [(&str, &str); 2] = [("SKIP_LINTING", "true"), ("SKIP_TYPE_CHECKING", "true")];

/// Outcome shared with every caller of one start sequence.
pub type StartOutcome = Result<Arc<dyn RequestHandler>, StartError>;

/// Static inputs of the start sequence.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    app_root: Utf8PathBuf,
    detector: ArtifactDetector,
    install_command: String,
    build_command: String,
}

impl LifecycleSettings {
    /// Builds settings from explicit values.
    #[must_use]
    pub fn new(
        app_root: impl Into<Utf8PathBuf>,
        detector: ArtifactDetector,
        install_command: impl Into<String>,
        build_command: impl Into<String>,
    ) -> Self {
        Self {
            app_root: app_root.into(),
            detector,
            install_command: install_command.into(),
            build_command: build_command.into(),
        }
    }

    /// Builds settings from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.app_root(),
            ArtifactDetector::from_config(config),
            config.install_command(),
            config.build_command(),
        )
    }

    /// Application root directory.
    #[must_use]
    pub fn app_root(&self) -> &Utf8Path {
        &self.app_root
    }
}

/// Collaborators the controller drives.
pub struct LifecycleDeps {
    /// Runs the install and build commands.
    pub runner: Arc<dyn ProcessRunner>,
    /// Prepares the runtime once the build output exists.
    pub launcher: Arc<dyn ApplicationLauncher>,
    /// Receives build and launch events.
    pub reporter: Arc<dyn HealthReporter>,
}

/// Owns the application state and serialises start sequences.
///
/// At most one sequence runs at a time. A trigger arriving while one is in
/// flight waits for it and receives its outcome. Once the runtime is prepared
/// every later trigger returns the same handler without touching the
/// collaborators again.
pub struct LifecycleController {
    settings: LifecycleSettings,
    deps: LifecycleDeps,
    inner: Mutex<Inner>,
}

struct Inner {
    state: ApplicationState,
    handler: Option<Arc<dyn RequestHandler>>,
    flight: Option<Arc<Flight>>,
}

/// Record of an in-flight sequence that joiners wait on.
struct Flight {
    outcome: Mutex<Option<StartOutcome>>,
    settled: Condvar,
}

impl Flight {
    const fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            settled: Condvar::new(),
        }
    }

    fn settle(&self, outcome: StartOutcome) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(outcome);
        self.settled.notify_all();
    }

    fn wait(&self) -> StartOutcome {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self
                .settled
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

enum Entry {
    Running(Arc<dyn RequestHandler>),
    Join(Arc<Flight>),
    Lead(Arc<Flight>),
}

/// Held by the thread leading a sequence. Dropping it unfinished, which only
/// happens while unwinding, still settles the flight so joiners and later
/// triggers are not left waiting.
struct Lead<'a> {
    controller: &'a LifecycleController,
    flight: Arc<Flight>,
    finished: bool,
}

impl Lead<'_> {
    fn finish(mut self, outcome: &StartOutcome) {
        self.settle(outcome);
        self.finished = true;
    }

    fn settle(&self, outcome: &StartOutcome) {
        self.controller.record(outcome);
        self.flight.settle(outcome.clone());
    }
}

impl Drop for Lead<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                target: LIFECYCLE_TARGET,
                "start sequence aborted before finishing"
            );
            self.settle(&Err(StartError::Interrupted));
        }
    }
}

impl LifecycleController {
    /// Builds a controller in the `NotBuilt` state.
    #[must_use]
    pub const fn new(settings: LifecycleSettings, deps: LifecycleDeps) -> Self {
        Self {
            settings,
            deps,
            inner: Mutex::new(Inner {
                state: ApplicationState::NotBuilt,
                handler: None,
                flight: None,
            }),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ApplicationState {
        self.lock_inner().state.clone()
    }

    /// Returns `true` once the runtime has been prepared.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_inner().state.is_running()
    }

    /// Handler installed by the last successful start sequence.
    #[must_use]
    pub fn handler(&self) -> Option<Arc<dyn RequestHandler>> {
        self.lock_inner().handler.clone()
    }

    /// Builds a fresh status snapshot. Never waits on a start sequence.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let app_root = self.settings.app_root();
        StatusSnapshot {
            version: self.settings.detector.read_version(app_root),
            built: self.settings.detector.is_built(app_root),
            running: self.is_running(),
        }
    }

    /// Builds the application if needed and prepares its runtime.
    ///
    /// Blocks until the sequence finishes. Concurrent callers share one
    /// sequence and all observe its outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`StartError`] when an install or build command fails or the
    /// launcher cannot prepare the runtime.
    pub fn start(&self) -> StartOutcome {
        let lead = match self.enter() {
            Entry::Running(handler) => {
                debug!(
                    target: LIFECYCLE_TARGET,
                    "application already running"
                );
                return Ok(handler);
            }
            Entry::Join(flight) => {
                debug!(
                    target: LIFECYCLE_TARGET,
                    "joining in-flight start sequence"
                );
                return flight.wait();
            }
            Entry::Lead(flight) => Lead {
                controller: self,
                flight,
                finished: false,
            },
        };

        let outcome = self.run_sequence();
        lead.finish(&outcome);
        outcome
    }

    /// Stops the runtime's resources.
    pub fn shutdown(&self) {
        self.deps.launcher.shutdown();
    }

    fn enter(&self) -> Entry {
        let mut inner = self.lock_inner();
        if let Some(handler) = inner.handler.as_ref() {
            return Entry::Running(Arc::clone(handler));
        }
        if let Some(flight) = inner.flight.as_ref() {
            return Entry::Join(Arc::clone(flight));
        }
        let flight = Arc::new(Flight::new());
        inner.flight = Some(Arc::clone(&flight));
        Entry::Lead(flight)
    }

    /// Commits a finished sequence and frees the flight slot.
    fn record(&self, outcome: &StartOutcome) {
        let mut inner = self.lock_inner();
        inner.flight = None;
        match outcome {
            Ok(handler) => {
                inner.handler = Some(Arc::clone(handler));
                inner.state = ApplicationState::Running;
            }
            Err(error) => {
                inner.state = ApplicationState::Failed(error.to_string());
            }
        }
    }

    fn transition(&self, state: ApplicationState) {
        info!(
            target: LIFECYCLE_TARGET,
            state = %state,
            "lifecycle transition"
        );
        self.lock_inner().state = state;
    }

    fn run_sequence(&self) -> StartOutcome {
        let app_root = self.settings.app_root();
        let reporter = &self.deps.reporter;

        if self.settings.detector.is_built(app_root) {
            debug!(
                target: LIFECYCLE_TARGET,
                app_root = %app_root,
                "build output present, skipping build"
            );
        } else {
            self.transition(ApplicationState::Building);
            reporter.build_starting(app_root);
            if let Err(error) = self.build(app_root) {
                self.remove_partial_output(app_root);
                reporter.build_failed(&error);
                return Err(error.into());
            }
            reporter.build_succeeded(app_root);
        }

        self.transition(ApplicationState::Starting);
        reporter.launch_starting(app_root);
        match self.deps.launcher.prepare(app_root) {
            Ok(handler) => {
                reporter.launch_ready(app_root);
                Ok(handler)
            }
            Err(error) => {
                reporter.launch_failed(&error);
                Err(error.into())
            }
        }
    }

    fn build(&self, app_root: &Utf8Path) -> Result<(), ProcessError> {
        let install = CommandLine::parse(&self.settings.install_command)?;
        let build = BUILD_ENV.iter().fold(
            CommandLine::parse(&self.settings.build_command)?,
            |command, (key, value)| command.with_env(*key, *value),
        );
        self.deps.runner.run(&install, app_root)?;
        self.deps.runner.run(&build, app_root)
    }

    fn remove_partial_output(&self, app_root: &Utf8Path) {
        let output = self.settings.detector.build_output_path(app_root);
        match fs::remove_dir_all(&output) {
            Ok(()) => {
                info!(
                    target: LIFECYCLE_TARGET,
                    path = %output,
                    "removed partial build output"
                );
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                warn!(
                    target: LIFECYCLE_TARGET,
                    path = %output,
                    %error,
                    "failed to remove partial build output"
                );
            }
        }
    }
}
