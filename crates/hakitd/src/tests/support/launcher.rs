//! In-process stand-ins for the application runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use camino::Utf8Path;
use serde_json::json;

use crate::dispatch::{AppRequest, AppResponse, RequestHandler};
use crate::launcher::{ApplicationLauncher, LaunchError};

/// Handler answering every request with its method and path echoed as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubHandler;

impl RequestHandler for StubHandler {
    fn handle(&self, request: &AppRequest) -> AppResponse {
        AppResponse::json(
            200,
            json!({
                "forwarded": request.path(),
                "method": request.method(),
            }),
        )
    }
}

/// Launcher that hands out a [`StubHandler`] or a scripted failure.
#[derive(Debug, Default)]
pub struct ScriptedLauncher {
    fail: bool,
    prepared: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl ScriptedLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Launcher whose every `prepare` reports the application exiting early.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn prepared(&self) -> usize {
        self.prepared.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl ApplicationLauncher for ScriptedLauncher {
    fn prepare(&self, _app_root: &Utf8Path) -> Result<Arc<dyn RequestHandler>, LaunchError> {
        self.prepared.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LaunchError::Exited {
                command: String::from("npm run start"),
                code: Some(1),
            });
        }
        Ok(Arc::new(StubHandler))
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
