//! Process-level supervision: singleton guard, health file, signals, and the
//! top-level launch sequence.

mod errors;
mod guard;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use errors::{DaemonError, RuntimeFileAction};
pub use launch::run_daemon;
pub use shutdown::ShutdownError;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
