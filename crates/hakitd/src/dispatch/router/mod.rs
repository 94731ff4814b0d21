//! Route table for the routing boundary.
//!
//! Fixed routes are consulted first, in table order. Only a request that no
//! fixed route claims reaches the catch-all slot, so the config page can never
//! be shadowed by the forwarded application. The slot is the lifecycle
//! controller's handler: it is empty, and answers 503, until a start sequence
//! succeeds.

use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use tracing::{debug, warn};

use crate::lifecycle::{LifecycleController, StartError};

use super::request::AppRequest;
use super::response::AppResponse;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Answers requests that reach the catch-all slot.
pub trait RequestHandler: Send + Sync {
    /// Produces a response for `request`. Failures are reported in-band.
    fn handle(&self, request: &AppRequest) -> AppResponse;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixedRoute {
    Status,
    Start,
    ConfigPage,
    Landing,
}

/// Fixed routes in match order.
const FIXED_ROUTES: [(&str, &str, FixedRoute); 4] = [
    ("POST", "/status", FixedRoute::Status),
    ("POST", "/start", FixedRoute::Start),
    ("GET", "/config", FixedRoute::ConfigPage),
    ("GET", "/", FixedRoute::Landing),
];

/// Routes requests to the lifecycle, the config page, or the application.
pub struct Router {
    lifecycle: Arc<LifecycleController>,
    config_page: Utf8PathBuf,
}

impl Router {
    /// Builds a router with an empty catch-all slot.
    #[must_use]
    pub fn new(lifecycle: Arc<LifecycleController>, config_page: impl Into<Utf8PathBuf>) -> Self {
        Self {
            lifecycle,
            config_page: config_page.into(),
        }
    }

    /// Routes a validated request.
    #[must_use]
    pub fn route(&self, request: &AppRequest) -> AppResponse {
        self.match_fixed(request).map_or_else(
            || self.forward(request),
            |route| {
                debug!(
                    target: DISPATCH_TARGET,
                    ?route,
                    "serving fixed route"
                );
                self.serve_fixed(route)
            },
        )
    }

    /// Runs the start sequence. Its handler becomes the catch-all slot.
    ///
    /// # Errors
    ///
    /// Returns the [`StartError`] reported by the lifecycle controller.
    pub fn start(&self) -> Result<(), StartError> {
        self.lifecycle.start().map(drop)
    }

    /// Stops the application runtime. The catch-all slot keeps its handler,
    /// which answers 502 once the upstream is gone.
    pub fn shutdown(&self) {
        self.lifecycle.shutdown();
    }

    /// Lifecycle controller behind the status and start routes.
    #[must_use]
    pub const fn lifecycle(&self) -> &Arc<LifecycleController> {
        &self.lifecycle
    }

    fn match_fixed(&self, request: &AppRequest) -> Option<FixedRoute> {
        FIXED_ROUTES
            .iter()
            .find(|(method, path, _)| request.matches(method, path))
            .map(|(_, _, route)| *route)
            .filter(|route| *route != FixedRoute::Landing || !self.lifecycle.is_running())
    }

    fn serve_fixed(&self, route: FixedRoute) -> AppResponse {
        match route {
            FixedRoute::Status => self.serve_status(),
            FixedRoute::Start => self.serve_start(),
            FixedRoute::ConfigPage | FixedRoute::Landing => self.serve_config_page(),
        }
    }

    fn serve_status(&self) -> AppResponse {
        match serde_json::to_value(self.lifecycle.status()) {
            Ok(body) => AppResponse::json(200, body),
            Err(error) => AppResponse::text(500, format!("failed to encode status: {error}")),
        }
    }

    fn serve_start(&self) -> AppResponse {
        match self.start() {
            Ok(()) => AppResponse::text(200, "application started"),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %error,
                    "start trigger failed"
                );
                AppResponse::text(500, format!("failed to start application: {error}"))
            }
        }
    }

    fn serve_config_page(&self) -> AppResponse {
        match fs::read_to_string(&self.config_page) {
            Ok(document) => AppResponse::html(200, document),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    path = %self.config_page,
                    %error,
                    "failed to read config page"
                );
                AppResponse::text(404, "config page not found")
            }
        }
    }

    fn forward(&self, request: &AppRequest) -> AppResponse {
        self.lifecycle.handler().map_or_else(
            || AppResponse::text(503, "application is not running"),
            |handler| handler.handle(request),
        )
    }
}
