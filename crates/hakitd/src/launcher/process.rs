//! Launcher that runs the application's own server as a child process.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::os::unix::process::CommandExt;
use std::process::{Child, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use hakit_config::Config;

use crate::dispatch::RequestHandler;
use crate::runner::CommandLine;

use super::errors::LaunchError;
use super::upstream::UpstreamHandler;
use super::{ApplicationLauncher, LAUNCHER_TARGET};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(250);
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Starts the application server and waits until its port accepts
/// connections.
///
/// The child runs in its own process group so that terminating it also stops
/// any server process the start command forks.
#[derive(Debug)]
pub struct ProcessLauncher {
    start_command: String,
    port: u16,
    launch_timeout: Duration,
    child: Mutex<Option<Child>>,
}

impl ProcessLauncher {
    /// Builds a launcher for `start_command` serving on `port`.
    #[must_use]
    pub fn new(start_command: impl Into<String>, port: u16, launch_timeout: Duration) -> Self {
        Self {
            start_command: start_command.into(),
            port,
            launch_timeout,
            child: Mutex::new(None),
        }
    }

    /// Builds a launcher from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.start_command(),
            config.upstream_port(),
            config.launch_timeout(),
        )
    }

    fn lock_child(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn(&self, app_root: &Utf8Path) -> Result<(String, Child), LaunchError> {
        let command = CommandLine::parse(&self.start_command)
            .map_err(|source| LaunchError::Command { source })?
            .with_env("PORT", self.port.to_string());
        let rendered = command.to_string();
        info!(
            target: LAUNCHER_TARGET,
            command = %rendered,
            cwd = %app_root,
            port = self.port,
            "starting application server"
        );
        let child = command
            .to_command()
            .current_dir(app_root)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: rendered.clone(),
                source: Arc::new(source),
            })?;
        Ok((rendered, child))
    }

    fn wait_until_ready(&self, command: &str, child: &mut Child) -> Result<(), LaunchError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return Err(LaunchError::Exited {
                        command: command.to_owned(),
                        code: status.code(),
                    });
                }
                Ok(None) => {}
                Err(source) => {
                    return Err(LaunchError::Wait {
                        command: command.to_owned(),
                        source: Arc::new(source),
                    });
                }
            }
            if TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok() {
                debug!(
                    target: LAUNCHER_TARGET,
                    port = self.port,
                    elapsed_ms = start.elapsed().as_millis(),
                    "application port accepting connections"
                );
                return Ok(());
            }
            if start.elapsed() > self.launch_timeout {
                return Err(LaunchError::NotReady {
                    port: self.port,
                    timeout: self.launch_timeout,
                });
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }
}

impl ApplicationLauncher for ProcessLauncher {
    fn prepare(&self, app_root: &Utf8Path) -> Result<Arc<dyn RequestHandler>, LaunchError> {
        let mut slot = self.lock_child();
        if let Some(mut stale) = slot.take() {
            warn!(
                target: LAUNCHER_TARGET,
                pid = stale.id(),
                "terminating previous application process"
            );
            terminate(&mut stale);
        }

        let (command, mut child) = self.spawn(app_root)?;
        if let Err(error) = self.wait_until_ready(&command, &mut child) {
            terminate(&mut child);
            return Err(error);
        }
        let handler = match UpstreamHandler::new(self.port) {
            Ok(handler) => handler,
            Err(error) => {
                terminate(&mut child);
                return Err(error);
            }
        };
        info!(
            target: LAUNCHER_TARGET,
            pid = child.id(),
            port = self.port,
            "application server ready"
        );
        *slot = Some(child);
        Ok(Arc::new(handler))
    }

    fn shutdown(&self) {
        if let Some(mut child) = self.lock_child().take() {
            info!(
                target: LAUNCHER_TARGET,
                pid = child.id(),
                "stopping application server"
            );
            terminate(&mut child);
        }
    }
}

impl Drop for ProcessLauncher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sends SIGTERM to the child's process group, escalating to SIGKILL when the
/// child outlives the grace period.
fn terminate(child: &mut Child) {
    let Ok(raw) = i32::try_from(child.id()) else {
        drop(child.kill());
        drop(child.wait());
        return;
    };
    let group = Pid::from_raw(raw);
    match killpg(group, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(errno) => {
            warn!(
                target: LAUNCHER_TARGET,
                pid = child.id(),
                %errno,
                "failed to signal application process group"
            );
        }
    }

    let deadline = Instant::now() + TERMINATE_GRACE;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => thread::sleep(READY_POLL_INTERVAL),
            Err(_) => break,
        }
    }

    drop(killpg(group, Signal::SIGKILL));
    drop(child.kill());
    drop(child.wait());
}
