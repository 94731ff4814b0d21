//! Connection handler double for listener tests.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ConnectionHandler, ConnectionStream};

/// Acknowledges every connection with `ack\n` and counts how many it saw.
#[derive(Default)]
pub(crate) struct AckHandler {
    connections: AtomicUsize,
}

impl AckHandler {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl ConnectionHandler for AckHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        self.connections.fetch_add(1, Ordering::SeqCst);
        let _ = stream.write_all(b"ack\n");
    }
}
