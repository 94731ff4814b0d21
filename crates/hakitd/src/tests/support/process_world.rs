//! Process supervision test world shared across BDD scenarios.
//!
//! Runs the real launch sequence on a background thread with scripted
//! subprocess collaborators and a shutdown signal the scenario triggers.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

use hakit_config::Config;

use crate::dispatch::{AppRequest, AppResponse};
use crate::health::HealthReporter;
use crate::launcher::ApplicationLauncher;
use crate::process::DaemonError;
use crate::process::launch::{LaunchPlan, RuntimeFactory, ServiceDeps, run_daemon_with};
use crate::process::shutdown::{ShutdownError, ShutdownSignal};
use crate::runner::ProcessRunner;

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::launcher::ScriptedLauncher;
use super::reporter::RecordingHealthReporter;
use super::runner::ScriptedRunner;

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub type StepResult = Result<(), String>;

/// Runtime factory handing out shared scripted collaborators.
#[derive(Clone, Default)]
pub struct TestRuntimeFactory {
    runner: Arc<ScriptedRunner>,
    launcher: Arc<ScriptedLauncher>,
}

impl RuntimeFactory for TestRuntimeFactory {
    fn runner(&self, _config: &Config) -> Arc<dyn ProcessRunner> {
        self.runner.clone()
    }

    fn launcher(&self, _config: &Config) -> Arc<dyn ApplicationLauncher> {
        self.launcher.clone()
    }
}

/// Shutdown signal released by the test instead of a Unix signal.
#[derive(Clone)]
pub struct TestShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl TestShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        *triggered = true;
        cvar.notify_all();
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        while !*triggered {
            triggered = cvar
                .wait(triggered)
                .expect("shutdown mutex poisoned during wait");
        }
        Ok(())
    }
}

pub struct ProcessTestWorld {
    loader: TestConfigLoader,
    reporter: Arc<RecordingHealthReporter>,
    runtime: TestRuntimeFactory,
    shutdown: TestShutdownSignal,
    handle: Option<thread::JoinHandle<Result<(), DaemonError>>>,
    result: Option<Result<(), DaemonError>>,
}

impl Default for ProcessTestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTestWorld {
    pub fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            runtime: TestRuntimeFactory::default(),
            shutdown: TestShutdownSignal::new(),
            handle: None,
            result: None,
        }
    }

    pub fn enable_autostart(&mut self) {
        self.loader = self.loader.clone().with_autostart();
    }

    pub fn stage_build_output(&self) -> StepResult {
        fs::create_dir_all(self.loader.app_root().join(".next")).map_err(|error| error.to_string())
    }

    pub fn start_background(&mut self) -> StepResult {
        if self.handle.is_some() {
            return Err("daemon already running".to_owned());
        }
        let plan = LaunchPlan {
            shutdown: self.shutdown.clone(),
            services: ServiceDeps {
                loader: self.loader.clone(),
                reporter: self.reporter.clone() as Arc<dyn HealthReporter>,
                runtime: self.runtime.clone(),
            },
        };
        self.handle = Some(thread::spawn(move || run_daemon_with(plan)));
        Ok(())
    }

    /// Runs a second daemon against the same runtime directory, in the
    /// calling thread, with shutdown already requested.
    pub fn run_again(&mut self) {
        let shutdown = TestShutdownSignal::new();
        shutdown.trigger();
        let plan = LaunchPlan {
            shutdown,
            services: ServiceDeps {
                loader: self.loader.clone(),
                reporter: self.reporter.clone() as Arc<dyn HealthReporter>,
                runtime: TestRuntimeFactory::default(),
            },
        };
        self.result = Some(run_daemon_with(plan));
    }

    pub fn run_with_invalid_config(&mut self) {
        let shutdown = TestShutdownSignal::new();
        shutdown.trigger();
        let plan = LaunchPlan {
            shutdown,
            services: ServiceDeps {
                loader: FailingConfigLoader,
                reporter: self.reporter.clone() as Arc<dyn HealthReporter>,
                runtime: TestRuntimeFactory::default(),
            },
        };
        self.result = Some(run_daemon_with(plan));
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    pub fn join_background(&mut self) -> StepResult {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| "daemon not running".to_owned())?;
        let result = handle
            .join()
            .map_err(|_| "daemon thread panicked".to_owned())?;
        self.result = Some(result);
        Ok(())
    }

    pub fn lock_path(&self) -> PathBuf {
        self.loader.runtime_dir().join("hakitd.lock")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.loader.runtime_dir().join("hakitd.pid")
    }

    pub fn health_path(&self) -> PathBuf {
        self.loader.runtime_dir().join("hakitd.health")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.loader.runtime_dir().join("hakitd.sock")
    }

    pub fn read_health(&self) -> Result<Value, String> {
        let content = fs::read_to_string(self.health_path()).map_err(|error| error.to_string())?;
        serde_json::from_str(&content).map_err(|error| error.to_string())
    }

    pub fn read_pid(&self) -> Result<u32, String> {
        let content = fs::read_to_string(self.pid_path()).map_err(|error| error.to_string())?;
        content.trim().parse().map_err(|error| format!("{error}"))
    }

    pub fn write_stale_runtime(&self) -> StepResult {
        fs::write(self.lock_path(), b"").map_err(|error| error.to_string())?;
        fs::write(self.pid_path(), b"0\n").map_err(|error| error.to_string())
    }

    pub fn wait_for_status(&self, expected: &str) -> StepResult {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if self
                .read_health()
                .is_ok_and(|snapshot| snapshot_status(&snapshot) == expected)
            {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
        Err(format!("daemon did not publish {expected} health snapshot"))
    }

    /// Polls until the scripted launcher has prepared the runtime.
    pub fn wait_for_launch(&self) -> StepResult {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if self.runtime.launcher.prepared() > 0 {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
        Err("application was not launched".to_owned())
    }

    /// Polls the status route over the socket until it reports running.
    pub fn wait_for_running(&self) -> Result<AppResponse, String> {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            let response = self.request("POST", "/status")?;
            if response.body()["running"] == true {
                return Ok(response);
            }
            if Instant::now() >= deadline {
                return Err(format!("application never reported running: {response:?}"));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Sends one request over the daemon socket and decodes the response.
    pub fn request(&self, method: &str, path: &str) -> Result<AppResponse, String> {
        let mut stream =
            UnixStream::connect(self.socket_path()).map_err(|error| error.to_string())?;
        let mut line =
            serde_json::to_vec(&AppRequest::new(method, path)).map_err(|error| error.to_string())?;
        line.push(b'\n');
        stream.write_all(&line).map_err(|error| error.to_string())?;

        let mut response = String::new();
        BufReader::new(stream)
            .read_line(&mut response)
            .map_err(|error| error.to_string())?;
        serde_json::from_str(&response).map_err(|error| error.to_string())
    }

    pub fn launcher(&self) -> &ScriptedLauncher {
        &self.runtime.launcher
    }

    pub fn builds_run(&self) -> usize {
        self.runtime.runner.calls().len()
    }

    pub fn last_result(&self) -> Option<&Result<(), DaemonError>> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&DaemonError> {
        self.result.as_ref()?.as_ref().err()
    }
}

impl Drop for ProcessTestWorld {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn snapshot_status(snapshot: &Value) -> &str {
    snapshot
        .get("status")
        .and_then(Value::as_str)
        .expect("health snapshot should contain a status field")
}
