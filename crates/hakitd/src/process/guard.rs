//! Singleton guard over the daemon's runtime files.
//!
//! The lock file is created exclusively; a leftover lock whose recorded pid is
//! no longer alive is treated as stale and replaced. Dropping the guard
//! removes the lock, pid, and health files.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde::Serialize;
use tracing::{info, warn};

use hakit_config::RuntimePaths;

use super::PROCESS_TARGET;
use super::errors::{DaemonError, RuntimeFileAction};

#[derive(Debug)]
pub(super) struct ProcessGuard {
    paths: RuntimePaths,
    _lock: File,
    pid: Option<u32>,
}

impl ProcessGuard {
    pub(super) fn acquire(paths: RuntimePaths) -> Result<Self, DaemonError> {
        let lock = acquire_lock(&paths)?;
        Ok(Self {
            paths,
            _lock: lock,
            pid: None,
        })
    }

    pub(super) fn write_pid(&mut self, pid: u32) -> Result<(), DaemonError> {
        let path = self.paths.pid_path();
        write_private(&path, format!("{pid}\n").as_bytes()).map_err(|source| {
            DaemonError::RuntimeFile {
                action: RuntimeFileAction::WritePid,
                path: path.clone(),
                source,
            }
        })?;
        self.pid = Some(pid);
        info!(
            target: PROCESS_TARGET,
            pid,
            file = %path.display(),
            "pid file written"
        );
        Ok(())
    }

    pub(super) fn write_health(&self, status: HealthState) -> Result<(), DaemonError> {
        let pid = self.pid.ok_or(DaemonError::MissingPid)?;
        let snapshot = HealthSnapshot::new(status, pid)?;
        let mut payload = serde_json::to_vec(&snapshot)?;
        payload.push(b'\n');
        let path = self.paths.health_path();
        write_private(&path, &payload).map_err(|source| DaemonError::RuntimeFile {
            action: RuntimeFileAction::WriteHealth,
            path: path.clone(),
            source,
        })?;
        info!(
            target: PROCESS_TARGET,
            status = snapshot.status,
            file = %path.display(),
            "health snapshot updated"
        );
        Ok(())
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        let artefacts = [
            ("lock", self.paths.lock_path()),
            ("pid", self.paths.pid_path()),
            ("health", self.paths.health_path()),
        ];
        for (kind, path) in artefacts {
            match fs::remove_file(&path) {
                Err(error) if error.kind() != io::ErrorKind::NotFound => {
                    warn!(
                        target: PROCESS_TARGET,
                        file = %path.display(),
                        kind,
                        error = %error,
                        "failed to remove runtime file"
                    );
                }
                _ => {}
            }
        }
    }
}

/// Daemon-level health published in the health file.
#[derive(Debug, Clone, Copy)]
pub(super) enum HealthState {
    Starting,
    Ready,
    Stopping,
}

impl HealthState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Stopping => "stopping",
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthSnapshot<'a> {
    status: &'a str,
    pid: u32,
    timestamp: u64,
}

impl HealthSnapshot<'_> {
    fn new(state: HealthState, pid: u32) -> Result<Self, DaemonError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|source| DaemonError::Clock { source })?
            .as_secs();
        Ok(Self {
            status: state.as_str(),
            pid,
            timestamp,
        })
    }
}

/// Truncates and writes `path` with owner-only permissions, syncing to disk.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Creates the lock file exclusively, reclaiming it once if the daemon that
/// left it behind is gone.
fn acquire_lock(paths: &RuntimePaths) -> Result<File, DaemonError> {
    let lock_path = paths.lock_path();
    let created = match create_lock(&lock_path) {
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            reclaim_stale_lock(paths)?;
            create_lock(&lock_path)
        }
        other => other,
    };
    let file = created.map_err(|source| DaemonError::RuntimeFile {
        action: RuntimeFileAction::CreateLock,
        path: lock_path.clone(),
        source,
    })?;
    info!(
        target: PROCESS_TARGET,
        file = %lock_path.display(),
        "acquired daemon lock"
    );
    Ok(file)
}

fn create_lock(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

fn reclaim_stale_lock(paths: &RuntimePaths) -> Result<(), DaemonError> {
    if let Some(pid) = read_pid(&paths.pid_path()) {
        if check_process(pid)? {
            info!(
                target: PROCESS_TARGET,
                pid,
                "another daemon holds the lock"
            );
            return Err(DaemonError::AlreadyRunning { pid });
        }
        warn!(
            target: PROCESS_TARGET,
            pid,
            "lock owner has exited; reclaiming runtime files"
        );
    }
    remove_stale(&paths.lock_path())?;
    remove_stale(&paths.pid_path())
}

fn read_pid(path: &Path) -> Option<u32> {
    let content = fs::read_to_string(path).ok()?;
    content.trim().parse::<u32>().ok()
}

fn remove_stale(path: &Path) -> Result<(), DaemonError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DaemonError::RuntimeFile {
            action: RuntimeFileAction::RemoveStale,
            path: PathBuf::from(path),
            source,
        }),
    }
}

/// Sends signal 0 to `pid`. EPERM still means the process exists.
fn check_process(pid: u32) -> Result<bool, DaemonError> {
    let Ok(raw) = i32::try_from(pid) else {
        return Ok(false);
    };
    if raw == 0 {
        return Ok(false);
    }
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(errno) => Err(DaemonError::CheckProcess { pid, source: errno }),
    }
}
