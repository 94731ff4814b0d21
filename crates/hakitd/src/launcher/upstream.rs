//! Forwards routed requests to the launched application over HTTP.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{AppRequest, AppResponse, RequestHandler};

use super::LAUNCHER_TARGET;
use super::errors::LaunchError;

/// Per-request timeout for forwarded calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request handler backed by the application's HTTP server on localhost.
#[derive(Debug, Clone)]
pub struct UpstreamHandler {
    base_url: String,
    client: Client,
}

impl UpstreamHandler {
    /// Builds a handler forwarding to `http://127.0.0.1:<port>`.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Client`] when the HTTP client cannot be built.
    pub fn new(port: u16) -> Result<Self, LaunchError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| LaunchError::Client {
                source: Arc::new(source),
            })?;
        Ok(Self {
            base_url: format!("http://127.0.0.1:{port}"),
            client,
        })
    }

    fn forward(&self, request: &AppRequest) -> Result<AppResponse, AppResponse> {
        let method = Method::from_bytes(request.method().to_ascii_uppercase().as_bytes())
            .map_err(|_| {
                AppResponse::text(400, format!("invalid method '{}'", request.method()))
            })?;
        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self.client.request(method, url);
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        let response = builder.send().map_err(|error| {
            warn!(
                target: LAUNCHER_TARGET,
                path = request.path(),
                %error,
                "forwarding to application failed"
            );
            AppResponse::text(502, format!("application unavailable: {error}"))
        })?;
        Ok(into_app_response(response))
    }
}

impl RequestHandler for UpstreamHandler {
    fn handle(&self, request: &AppRequest) -> AppResponse {
        debug!(
            target: LAUNCHER_TARGET,
            method = request.method(),
            path = request.path(),
            "forwarding request to application"
        );
        self.forward(request).unwrap_or_else(|response| response)
    }
}

fn into_app_response(response: Response) -> AppResponse {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_owned();
    let text = match response.text() {
        Ok(text) => text,
        Err(error) => {
            return AppResponse::text(502, format!("failed to read application response: {error}"));
        }
    };
    let body = if content_type.starts_with("application/json") {
        serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text))
    } else {
        Value::String(text)
    };
    AppResponse::new(status, content_type, body)
}
