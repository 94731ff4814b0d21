//! BDD test world: bootstrap the daemon, assemble its router, and drive
//! requests through it.

use std::cell::RefCell;
use std::fs;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};
use crate::dispatch::{AppRequest, AppResponse, Router};

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::launcher::ScriptedLauncher;
use super::reporter::RecordingHealthReporter;
use super::runner::ScriptedRunner;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    app: TestConfigLoader,
    pub reporter: Arc<RecordingHealthReporter>,
    runner: Arc<ScriptedRunner>,
    pub launcher: Arc<ScriptedLauncher>,
    daemon: Option<Daemon>,
    router: Option<Router>,
    bootstrap_error: Option<BootstrapError>,
    responses: Vec<AppResponse>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        let app = TestConfigLoader::new();
        Self {
            loader: Box::new(app.clone()),
            app,
            reporter: Arc::new(RecordingHealthReporter::default()),
            runner: Arc::new(ScriptedRunner::new()),
            launcher: Arc::new(ScriptedLauncher::new()),
            daemon: None,
            router: None,
            bootstrap_error: None,
            responses: Vec::new(),
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.reset_results();
    }

    /// Installs a loader that succeeds.
    pub fn use_successful_loader(&mut self) {
        self.loader = Box::new(self.app.clone());
        self.reset_results();
    }

    /// Uses a runner whose build command produces the build output.
    pub fn use_building_runner(&mut self) {
        self.runner = Arc::new(
            ScriptedRunner::new().creating_on("npm run build", self.app.app_root().join(".next")),
        );
    }

    /// Uses a runner whose install command exits non-zero.
    pub fn use_failing_install(&mut self) {
        self.runner = Arc::new(ScriptedRunner::new().failing_on("npm ci"));
    }

    /// Uses a launcher whose application exits before becoming ready.
    pub fn use_failing_launcher(&mut self) {
        self.launcher = Arc::new(ScriptedLauncher::failing());
    }

    pub fn stage_manifest(&self, version: &str) {
        let root = self.app.app_root();
        fs::create_dir_all(&root).expect("failed to create application root");
        fs::write(
            root.join("package.json"),
            format!(r#"{{"version":"{version}"}}"#),
        )
        .expect("failed to write manifest");
    }

    pub fn stage_build_output(&self) {
        fs::create_dir_all(self.app.app_root().join(".next"))
            .expect("failed to create build output");
    }

    pub fn stage_config_page(&self, html: &str) {
        let path = self.app.runtime_dir().join("config.html");
        fs::write(path, html).expect("failed to write config page");
    }

    /// Runs the bootstrap sequence once and assembles the router.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }

        match bootstrap_with(&*self.loader, self.reporter.clone()) {
            Ok(daemon) => {
                self.router = Some(daemon.assemble(self.runner.clone(), self.launcher.clone()));
                self.daemon = Some(daemon);
            }
            Err(error) => {
                self.bootstrap_error = Some(error);
            }
        }
    }

    /// Routes a request and records the response.
    pub fn send(&mut self, method: &str, path: &str) {
        let Some(router) = self.router.as_ref() else {
            return;
        };
        let response = router.route(&AppRequest::new(method, path));
        self.responses.push(response);
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns true when the daemon handle is available.
    #[must_use]
    pub fn daemon_started(&self) -> bool {
        self.daemon.is_some()
    }

    pub fn last_response(&self) -> Option<&AppResponse> {
        self.responses.last()
    }

    /// Number of times the scripted runner executed `line`.
    pub fn runs_of(&self, line: &str) -> usize {
        self.runner.count(line)
    }

    fn reset_results(&mut self) {
        self.daemon = None;
        self.router = None;
        self.bootstrap_error = None;
        self.responses.clear();
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
