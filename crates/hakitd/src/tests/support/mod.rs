//! Test harness utilities shared by the daemon's unit and behavioural suites.

mod app_root;
mod config_loader;
mod launcher;
mod process_world;
mod reporter;
mod runner;
mod world;

pub use app_root::TempAppRoot;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use launcher::{ScriptedLauncher, StubHandler};
pub use process_world::{
    ProcessTestWorld, StepResult, TestRuntimeFactory, TestShutdownSignal, snapshot_status,
};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use runner::ScriptedRunner;
pub use world::{TestWorld, world};
