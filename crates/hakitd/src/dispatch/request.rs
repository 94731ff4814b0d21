//! Request deserialisation for the dispatch loop.
//!
//! A request line carries an HTTP-style method and path plus an optional JSON
//! body. The same shape is forwarded verbatim to the launched application.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DispatchError;

/// Request received from a client of the routing boundary.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppRequest {
    method: String,
    path: String,
    #[serde(default)]
    body: Option<Value>,
}

impl AppRequest {
    /// Builds a request without a body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: None,
        }
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Parses a JSONL line into a request.
    ///
    /// Trailing whitespace, including the newline delimiter, is trimmed before
    /// parsing.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MalformedJsonl` if the line is empty or is not
    /// valid JSON matching the request schema.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = line.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }

        serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
    }

    /// Validates that the method is present and the path is absolute.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidStructure` when either field is unusable.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.method().is_empty() {
            return Err(DispatchError::invalid_structure("method field is empty"));
        }
        if !self.path().starts_with('/') {
            return Err(DispatchError::invalid_structure(
                "path field must start with '/'",
            ));
        }
        Ok(())
    }

    /// Returns the trimmed method.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method.trim()
    }

    /// Returns the trimmed path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.trim()
    }

    /// Returns the JSON body, when one was sent.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref().filter(|body| !body.is_null())
    }

    /// Returns `true` when the request matches `method` and `path`.
    ///
    /// Methods compare case-insensitively; paths compare exactly.
    #[must_use]
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.method().eq_ignore_ascii_case(method) && self.path() == path
    }
}
