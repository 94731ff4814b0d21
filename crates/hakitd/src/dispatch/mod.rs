//! JSONL routing boundary for the application host.
//!
//! Each connection carries one request line and receives one response line.
//! Requests name an HTTP-style method and path, plus an optional JSON body:
//!
//! ```json
//! {"method":"POST","path":"/status"}
//! ```
//!
//! Responses carry a status code, a content type, and a JSON body:
//!
//! ```json
//! {"status":200,"content_type":"application/json","body":{"version":"1.2.0","built":true,"running":false}}
//! ```
//!
//! ## Routing
//!
//! The fixed routes (`POST /status`, `POST /start`, `GET /config`, and
//! `GET /` while the application is down) are matched first. Anything else
//! falls through to the catch-all slot, which forwards to the running
//! application once a start sequence has installed a handler.

mod errors;
mod handler;
mod request;
mod response;
mod router;

pub use self::errors::DispatchError;
pub(crate) use self::handler::DispatchConnectionHandler;
pub use self::request::AppRequest;
pub use self::response::{AppResponse, ResponseWriter};
pub use self::router::{RequestHandler, Router};
