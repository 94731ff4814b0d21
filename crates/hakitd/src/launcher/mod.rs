//! Preparation of the application runtime.
//!
//! An [`ApplicationLauncher`] turns a built application root into a
//! [`RequestHandler`] that the routing boundary installs into its catch-all
//! slot. The production [`ProcessLauncher`] starts the application's own
//! server as a child process and forwards requests to it over HTTP.

mod errors;
mod process;
mod upstream;

use std::sync::Arc;

use camino::Utf8Path;

use crate::dispatch::RequestHandler;

pub use errors::LaunchError;
pub use process::ProcessLauncher;
pub use upstream::UpstreamHandler;

pub(crate) const LAUNCHER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launcher");

/// Prepares the application runtime and hands back its request handler.
pub trait ApplicationLauncher: Send + Sync {
    /// Initialises the runtime rooted at `app_root`.
    ///
    /// # Errors
    ///
    /// Returns a [`LaunchError`] when the runtime cannot be brought up.
    fn prepare(&self, app_root: &Utf8Path) -> Result<Arc<dyn RequestHandler>, LaunchError>;

    /// Releases any runtime resources. Called once during daemon shutdown.
    fn shutdown(&self);
}

impl<T> ApplicationLauncher for Arc<T>
where
    T: ApplicationLauncher + ?Sized,
{
    fn prepare(&self, app_root: &Utf8Path) -> Result<Arc<dyn RequestHandler>, LaunchError> {
        (**self).prepare(app_root)
    }

    fn shutdown(&self) {
        (**self).shutdown();
    }
}
