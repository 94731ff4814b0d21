//! Response serialisation helpers for the dispatch loop.
//!
//! Every connection receives exactly one JSONL response line carrying a
//! status code, a content type, and a JSON body.

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DispatchError;

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";
pub(crate) const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub(crate) const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Response returned to a client of the routing boundary.
///
/// Text and HTML payloads travel as JSON strings; JSON payloads are embedded
/// as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppResponse {
    status: u16,
    content_type: String,
    body: Value,
}

impl AppResponse {
    /// Builds a response from its parts.
    #[must_use]
    pub fn new(status: u16, content_type: impl Into<String>, body: Value) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    /// Builds a JSON response.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, JSON_CONTENT_TYPE, body)
    }

    /// Builds a plain-text response.
    #[must_use]
    pub fn text(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, TEXT_CONTENT_TYPE, Value::String(message.into()))
    }

    /// Builds an HTML response.
    #[must_use]
    pub fn html(status: u16, document: impl Into<String>) -> Self {
        Self::new(status, HTML_CONTENT_TYPE, Value::String(document.into()))
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Content type of the body.
    #[must_use]
    pub const fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }
}

/// Writer that serialises responses to a stream.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a response as a JSONL line and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation, writing, or flushing fails.
    pub fn write_response(&mut self, response: &AppResponse) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes a plain-text error response derived from `error`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_error(&mut self, error: &DispatchError) -> Result<(), DispatchError> {
        self.write_response(&AppResponse::text(
            error.status_code(),
            format!("error: {error}"),
        ))
    }
}
