//! Connection handler that dispatches JSONL requests.
//!
//! `DispatchConnectionHandler` implements the transport layer's
//! `ConnectionHandler`: it reads one bounded request line, parses and validates
//! it, hands it to the [`Router`], and writes the single response line back.

use std::io::{self, Read};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::errors::DispatchError;
use super::request::AppRequest;
use super::response::ResponseWriter;
use super::router::{DISPATCH_TARGET, Router};

/// Maximum size of a single request line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Connection handler that parses and routes JSONL requests.
pub struct DispatchConnectionHandler {
    router: Arc<Router>,
}

impl DispatchConnectionHandler {
    /// Creates a handler answering through `router`.
    #[must_use]
    pub const fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    fn dispatch(&self, stream: &mut ConnectionStream) {
        let request_bytes = match read_request_line(stream) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                answer_error(&mut ResponseWriter::new(stream), &error);
                return;
            }
        };

        let mut writer = ResponseWriter::new(stream);
        let request = match AppRequest::parse(&request_bytes).and_then(|request| {
            request.validate()?;
            Ok(request)
        }) {
            Ok(request) => request,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected request");
                answer_error(&mut writer, &error);
                return;
            }
        };

        debug!(
            target: DISPATCH_TARGET,
            method = request.method(),
            path = request.path(),
            "dispatching request"
        );
        let response = self.router.route(&request);
        if let Err(error) = writer.write_response(&response) {
            warn!(target: DISPATCH_TARGET, %error, "failed to write response");
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        self.dispatch(&mut stream);
    }
}

/// Sends an error line; the client may already be gone, so failures are only
/// logged.
fn answer_error(writer: &mut ResponseWriter<&mut ConnectionStream>, error: &DispatchError) {
    if let Err(write_error) = writer.write_error(error) {
        debug!(
            target: DISPATCH_TARGET,
            error = %write_error,
            "failed to send error response"
        );
    }
}

/// Reads a bounded JSONL request line from the stream.
///
/// Returns `Ok(None)` if the client disconnects without sending data, and
/// `Ok(Some(bytes))` once a full line (or EOF after partial data) arrives.
fn read_request_line(stream: &mut ConnectionStream) -> Result<Option<Vec<u8>>, DispatchError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = read_with_retry(stream, &mut chunk)?;
        if bytes_read == 0 {
            return Ok((!buffer.is_empty()).then_some(buffer));
        }

        let received = chunk.get(..bytes_read).unwrap_or_default();
        let segment = received
            .split_inclusive(|byte| *byte == b'\n')
            .next()
            .unwrap_or_default();
        buffer.extend_from_slice(segment);
        enforce_limit(buffer.len())?;
        if segment.ends_with(b"\n") {
            return Ok(Some(buffer));
        }
    }
}

fn read_with_retry(stream: &mut ConnectionStream, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

const fn enforce_limit(size: usize) -> Result<(), DispatchError> {
    if size > MAX_REQUEST_BYTES {
        return Err(DispatchError::request_too_large(size, MAX_REQUEST_BYTES));
    }
    Ok(())
}
