//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use hakit_config::{Config, RuntimePaths};

use crate::StructuredHealthReporter;
use crate::artifact::ArtifactDetector;
use crate::bootstrap::{ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::{DispatchConnectionHandler, Router};
use crate::health::HealthReporter;
use crate::launcher::{ApplicationLauncher, ProcessLauncher};
use crate::runner::{ProcessRunner, SystemProcessRunner};
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::DaemonError;
use super::guard::{HealthState, ProcessGuard};
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Builds the subprocess collaborators once configuration is known.
pub(crate) trait RuntimeFactory: Send + Sync {
    /// Runner used for install and build commands.
    fn runner(&self, config: &Config) -> Arc<dyn ProcessRunner>;

    /// Launcher used to prepare the application runtime.
    fn launcher(&self, config: &Config) -> Arc<dyn ApplicationLauncher>;
}

/// Factory producing real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemRuntimeFactory;

impl RuntimeFactory for SystemRuntimeFactory {
    fn runner(&self, config: &Config) -> Arc<dyn ProcessRunner> {
        Arc::new(SystemProcessRunner::new(config.build_timeout()))
    }

    fn launcher(&self, config: &Config) -> Arc<dyn ApplicationLauncher> {
        Arc::new(ProcessLauncher::from_config(config))
    }
}

/// Service dependencies required to construct the daemon runtime.
pub(crate) struct ServiceDeps<L, R> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) runtime: R,
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, R, S> {
    pub(crate) shutdown: S,
    pub(crate) services: ServiceDeps<L, R>,
}

/// Runs the daemon in the foreground using the production collaborators.
///
/// Returns once a termination signal has been handled and the application
/// process has been stopped.
///
/// # Errors
///
/// Returns a [`DaemonError`] when configuration, runtime files, bootstrap, or
/// the socket listener cannot be set up.
pub fn run_daemon() -> Result<(), DaemonError> {
    let plan = LaunchPlan {
        shutdown: SystemShutdownSignal,
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            runtime: SystemRuntimeFactory,
        },
    };
    run_daemon_with(plan)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, R, S>(plan: LaunchPlan<L, R, S>) -> Result<(), DaemonError>
where
    L: ConfigLoader,
    R: RuntimeFactory,
    S: ShutdownSignal,
{
    let LaunchPlan { shutdown, services } = plan;
    let ServiceDeps {
        loader,
        reporter,
        runtime,
    } = services;

    info!(
        target: PROCESS_TARGET,
        "starting daemon runtime"
    );
    let config = loader.load()?;
    // The runtime files and the listener live beside the socket.
    config.daemon_socket().prepare_filesystem()?;
    let runtime_paths = RuntimePaths::from_config(&config)?;
    let mut guard = ProcessGuard::acquire(runtime_paths)?;
    guard.write_pid(std::process::id())?;
    guard.write_health(HealthState::Starting)?;
    let listener = SocketListener::bind(config.daemon_socket())?;

    let static_loader = StaticConfigLoader::new(config.clone());
    let daemon = bootstrap_with(&static_loader, reporter)?;
    let router = Arc::new(daemon.assemble(runtime.runner(&config), runtime.launcher(&config)));
    let handler = Arc::new(DispatchConnectionHandler::new(Arc::clone(&router)));

    let listener_handle = listener.start(handler)?;
    if config.autostart() {
        autostart(&config, &router);
    }
    guard.write_health(HealthState::Ready)?;
    shutdown.wait()?;
    guard.write_health(HealthState::Stopping)?;
    listener_handle.shutdown();
    listener_handle.join()?;
    router.shutdown();
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}

/// Starts an already-built application in the background so the listener
/// keeps answering status queries meanwhile.
fn autostart(config: &Config, router: &Arc<Router>) {
    let detector = ArtifactDetector::from_config(config);
    if !detector.is_built(config.app_root()) {
        info!(
            target: PROCESS_TARGET,
            app_root = %config.app_root(),
            "application not built; waiting for a start trigger"
        );
        return;
    }
    let trigger = Arc::clone(router);
    let spawned = thread::Builder::new()
        .name(String::from("hakitd-autostart"))
        .spawn(move || {
            if let Err(error) = trigger.start() {
                warn!(
                    target: PROCESS_TARGET,
                    %error,
                    "autostart failed"
                );
            }
        });
    if let Err(error) = spawned {
        warn!(
            target: PROCESS_TARGET,
            %error,
            "failed to spawn autostart thread"
        );
    }
}
