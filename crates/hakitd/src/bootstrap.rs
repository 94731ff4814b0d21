//! First stage of daemon start-up: resolve configuration and wire the router.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use hakit_config::Config;

use crate::dispatch::Router;
use crate::health::HealthReporter;
use crate::launcher::ApplicationLauncher;
use crate::lifecycle::{LifecycleController, LifecycleDeps, LifecycleSettings};
use crate::runner::ProcessRunner;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Where the daemon's [`Config`] comes from.
pub trait ConfigLoader: Send + Sync {
    /// Resolves the configuration, or explains why it is unusable.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Reads defaults, the config file, `HAKIT_*` variables, and CLI flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out an already-resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Reasons the daemon could not be brought up.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// No configuration layer produced a usable [`Config`].
    #[error("configuration is invalid: {source}")]
    Configuration {
        /// Error raised by the configuration loader.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The tracing subscriber could not be installed.
    #[error("structured logging could not be installed: {source}")]
    Telemetry {
        /// Underlying telemetry failure.
        #[source]
        source: TelemetryError,
    },
}

/// A bootstrapped daemon, ready to have its router assembled.
pub struct Daemon {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Wires the lifecycle controller and router around the given
    /// subprocess collaborators.
    #[must_use]
    pub fn assemble(
        &self,
        runner: Arc<dyn ProcessRunner>,
        launcher: Arc<dyn ApplicationLauncher>,
    ) -> Router {
        let controller = LifecycleController::new(
            LifecycleSettings::from_config(&self.config),
            LifecycleDeps {
                runner,
                launcher,
                reporter: Arc::clone(&self.reporter),
            },
        );
        Router::new(Arc::new(controller), self.config.config_page())
    }
}

/// Loads configuration and installs logging.
///
/// The socket directory is left to the caller that binds the socket. Nothing
/// about the managed application is touched here: it is neither
/// built nor launched until a start trigger arrives.
///
/// # Errors
///
/// Returns the first [`BootstrapError`] encountered, after reporting it
/// through `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    match prepare(loader) {
        Ok((config, telemetry)) => {
            reporter.bootstrap_succeeded(&config);
            Ok(Daemon {
                config,
                telemetry,
                reporter,
            })
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn prepare(loader: &dyn ConfigLoader) -> Result<(Config, TelemetryHandle), BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    Ok((config, telemetry))
}
