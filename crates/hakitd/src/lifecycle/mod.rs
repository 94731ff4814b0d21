//! Application lifecycle: state machine, status, and start orchestration.
//!
//! The [`LifecycleController`] decides whether a build is needed, runs the
//! install and build commands through a [`ProcessRunner`], prepares the
//! runtime through an [`ApplicationLauncher`], and records the resulting
//! [`ApplicationState`]. Status queries read the disk and the state holder
//! directly and never wait for a running sequence.
//!
//! [`ProcessRunner`]: crate::runner::ProcessRunner
//! [`ApplicationLauncher`]: crate::launcher::ApplicationLauncher

mod controller;
mod errors;
mod state;

pub use controller::{LifecycleController, LifecycleDeps, LifecycleSettings, StartOutcome};
pub use errors::StartError;
pub use state::{ApplicationState, StatusSnapshot};

pub(crate) const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");
