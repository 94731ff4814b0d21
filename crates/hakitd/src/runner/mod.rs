//! Synchronous execution of external install and build commands.
//!
//! [`SystemProcessRunner`] spawns the command in the application root with the
//! daemon's own stdout and stderr inherited, so build output streams straight
//! to the operator's terminal or log sink. The call blocks until the child
//! exits or its time budget runs out. Each command runs in its own process
//! group, and a timeout kills the whole group so that workers forked by the
//! build tool cannot keep writing into the application root.
//!
//! The [`ProcessRunner`] trait is the seam the lifecycle controller depends
//! on; tests substitute doubles that record invocations instead of spawning.

mod command;
mod errors;

use std::os::unix::process::CommandExt;
use std::process::{Child, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

pub use command::CommandLine;
pub use errors::ProcessError;

const RUNNER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runner");
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs an external command to completion.
pub trait ProcessRunner: Send + Sync {
    /// Executes `command` inside `working_dir`, blocking until it exits.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] when the command cannot be spawned, exits
    /// with a non-zero status, or exceeds the runner's time budget.
    fn run(&self, command: &CommandLine, working_dir: &Utf8Path) -> Result<(), ProcessError>;
}

impl<T> ProcessRunner for Arc<T>
where
    T: ProcessRunner + ?Sized,
{
    fn run(&self, command: &CommandLine, working_dir: &Utf8Path) -> Result<(), ProcessError> {
        (**self).run(command, working_dir)
    }
}

/// Runner that spawns real child processes with inherited stdio.
#[derive(Debug, Clone, Copy)]
pub struct SystemProcessRunner {
    timeout: Duration,
}

impl SystemProcessRunner {
    /// Builds a runner enforcing `timeout` on every command.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &CommandLine, working_dir: &Utf8Path) -> Result<(), ProcessError> {
        let rendered = command.to_string();
        info!(
            target: RUNNER_TARGET,
            command = %rendered,
            cwd = %working_dir,
            "running command"
        );

        let mut child = command
            .to_command()
            .current_dir(working_dir)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: rendered.clone(),
                source: Arc::new(source),
            })?;

        wait_for_exit(&rendered, &mut child, self.timeout)?;
        info!(
            target: RUNNER_TARGET,
            command = %rendered,
            "command completed"
        );
        Ok(())
    }
}

/// Polls the child until it exits, killing its process group once `timeout`
/// elapses.
fn wait_for_exit(command: &str, child: &mut Child, timeout: Duration) -> Result<(), ProcessError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(
                    target: RUNNER_TARGET,
                    command,
                    ?status,
                    "command exited"
                );
                if status.success() {
                    return Ok(());
                }
                return Err(ProcessError::Exit {
                    command: command.to_owned(),
                    code: status.code(),
                });
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    warn!(
                        target: RUNNER_TARGET,
                        command,
                        ?timeout,
                        "command timed out, killing process group"
                    );
                    kill_group(child);
                    return Err(ProcessError::Timeout {
                        command: command.to_owned(),
                        timeout,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                return Err(ProcessError::Wait {
                    command: command.to_owned(),
                    source: Arc::new(source),
                });
            }
        }
    }
}

/// Sends SIGKILL to the child's process group and reaps the child.
fn kill_group(child: &mut Child) {
    if let Ok(raw) = i32::try_from(child.id()) {
        match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(errno) => {
                warn!(
                    target: RUNNER_TARGET,
                    pid = raw,
                    %errno,
                    "failed to kill command process group"
                );
            }
        }
    }
    drop(child.kill());
    drop(child.wait());
}
