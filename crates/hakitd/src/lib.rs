//! Application host daemon.
//!
//! `hakitd` owns a single web application that lives on disk as source code.
//! It reports whether the application is built and running, builds it on
//! demand with the configured install and build commands, and then launches
//! it and forwards every request the daemon does not answer itself.
//!
//! Requests arrive as JSONL lines on the socket configured through
//! [`hakit_config`]. A small set of fixed routes (status, start trigger, and
//! the static config page) is always matched before the catch-all slot, so the
//! launched application can never shadow them. See the [`dispatch`] module for
//! the wire format.
//!
//! Start triggers are single-flight: while one install, build, and launch
//! sequence runs, further triggers wait for it and share its outcome, and
//! status queries keep answering from fresh filesystem checks.
//!
//! Lifecycle events are published through a [`HealthReporter`] so operators
//! can follow bootstrap, build, and launch progress in structured logs.

mod artifact;
mod bootstrap;
pub mod dispatch;
mod health;
mod launcher;
mod lifecycle;
mod process;
mod runner;
pub mod telemetry;
mod transport;

pub use artifact::ArtifactDetector;
pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use launcher::{ApplicationLauncher, LaunchError, ProcessLauncher, UpstreamHandler};
pub use lifecycle::{
    ApplicationState, LifecycleController, LifecycleDeps, LifecycleSettings, StartError,
    StartOutcome, StatusSnapshot,
};
pub use process::{DaemonError, RuntimeFileAction, ShutdownError, run_daemon};
pub use runner::{CommandLine, ProcessError, ProcessRunner, SystemProcessRunner};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
