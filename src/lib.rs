//! derkhttpd — a minimal, blocking HTTP/1.1 origin server.
//!
//! A single-threaded poll loop accepts connections and fans each tick's
//! ready clients onto short-lived worker threads, joined before the next
//! tick (spec.md §5). Each worker reads one request end to end over a
//! fixed-capacity buffer, dispatches it against an exact-path route table,
//! and writes one response — no request pipelining, no background tasks,
//! no allocator tricks beyond what a `Vec<u8>` gives you for free.
//!
//! # Quick start
//!
//! ```no_run
//! use derkhttpd::{
//!     dispatcher::{self, Dispatcher, RUNNING},
//!     http::response::Response,
//!     http::types::Status,
//!     limits::ServerLimits,
//!     net,
//!     routes::{default_fallback, Routes},
//! };
//!
//! let listener = net::listener::bind(8080, 128).expect("failed to bind");
//!
//! let mut routes = Routes::new("localhost:8080", default_fallback());
//! routes.register("/", Box::new(|_req, _params| {
//!     let mut response = Response::with_blob(Status::Ok, b"hello world".to_vec());
//!     response.headers_mut().set("Content-Length", "11");
//!     response.headers_mut().set("Content-Type", "text/plain");
//!     response
//! }));
//!
//! dispatcher::install_sigint_handler();
//! Dispatcher::new(listener, routes, ServerLimits::default()).run(&RUNNING);
//! ```
//!
//! # Module map
//!
//! - [`http`] — the data model (`Request`, `Response`, `Verb`, `Schema`,
//!   `Status`, `HeaderMap`), the URI parser, the intake state machine, and
//!   the outtake serializer.
//! - [`resource`] — body sources a handler can hand back: an open file
//!   ([`resource::TextualFile`]), an owned byte buffer
//!   ([`resource::StringReply`]), or a bare status
//!   ([`resource::EmptyReply`]).
//! - [`routes`] — the exact-path handler registry and dispatch algorithm.
//! - [`dispatcher`] — the poll loop and the SIGINT-driven running flag.
//! - [`net`] — fixed-buffer socket I/O and listener setup.
//! - [`limits`] — every tunable in one place.
//!
//! The message-exchange task that ties intake, dispatch, conditional
//! caching, and outtake together per request is crate-internal
//! ([`exchange`] is not part of the public surface) — external
//! collaborators interact with the server only through [`routes::Routes`]
//! and the [`resource::Resource`] trait.

pub mod http {
    pub mod request;
    pub mod response;
    pub mod types;
    pub mod uri;
}
pub mod dispatcher;
pub mod limits;
pub mod net;
pub mod resource;
pub mod routes;

pub(crate) mod errors;
mod exchange;

pub use crate::{
    http::{
        request::Request,
        response::{Body, ChunkIterator, Response},
        types::{HeaderMap, Schema, Status, Verb},
        uri::{QueryValue, Uri},
    },
    resource::Resource,
    routes::{Handler, Routes},
};
