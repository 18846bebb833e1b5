//! Exact-path handler registry and dispatch (spec.md §4.6).
//!
//! Grounded on `myapp/routes.hpp`/`.cpp`: a `Middleware` alias for
//! `(Request, params) -> Response`, one fallback, and a registration that
//! refuses duplicates without overwriting. `dispatch_handler`'s body
//! (Host validation, URI parsing, lookup-or-fallback) is authored from
//! spec.md §4.6 directly — the retrieved original only shows the fallback
//! handler and `set_handler`, not the dispatch routine itself.

use crate::{
    http::{request::Request, response::Response, types::Status, uri, uri::QueryValue},
    http::types::Schema,
};
use std::collections::{hash_map::Entry, HashMap};

/// A callable that turns a request and its decoded query parameters into
/// a response (spec.md §6 "Handler contract").
pub type Handler = Box<dyn Fn(Request, &[(String, QueryValue)]) -> Response + Send + Sync>;

/// Exact-path route table plus the single fallback handler (spec.md
/// §4.6).
pub struct Routes {
    host_name: String,
    host_port: Option<String>,
    handlers: HashMap<String, Handler>,
    fallback: Handler,
}

impl Routes {
    /// `host` is the configured `<name>[:<port>]` pair every request's
    /// `Host` header is checked against.
    pub fn new(host: &str, fallback: Handler) -> Self {
        let (host_name, host_port) = match host.rsplit_once(':') {
            Some((name, port)) => (name.to_string(), Some(port.to_string())),
            None => (host.to_string(), None),
        };

        Self { host_name, host_port, handlers: HashMap::new(), fallback }
    }

    /// Registers `handler` under `path`. Returns `false` without
    /// overwriting if a handler is already registered there.
    pub fn register(&mut self, path: impl Into<String>, handler: Handler) -> bool {
        match self.handlers.entry(path.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handler);
                true
            }
        }
    }

    fn host_matches(&self, value: &str) -> bool {
        match value.rsplit_once(':') {
            None => value == self.host_name,
            Some((name, port)) => {
                name == self.host_name && self.host_port.as_deref() == Some(port)
            }
        }
    }

    /// Runs the dispatch algorithm of spec.md §4.6 steps 1-4.
    pub(crate) fn dispatch_handler(&self, request: Request) -> Response {
        if request.schema() == Schema::Http11 && request.headers().get("Host").is_none() {
            return Response::new(Status::BadRequest);
        }

        if let Some(host) = request.headers().get("Host") {
            if !self.host_matches(host) {
                return Response::new(Status::BadRequest);
            }
        }

        let decoded = match uri::parse(request.uri()) {
            Ok(decoded) => decoded,
            Err(_) => return Response::new(Status::BadRequest),
        };

        match self.handlers.get(decoded.path()) {
            Some(handler) => handler(request, decoded.params()),
            None => (self.fallback)(request, &[]),
        }
    }
}

/// A fallback handler matching the reference server's `dud_fallback_handler`:
/// 404 with an empty body, `Content-Type: */*`, `Content-Length: 0`.
pub fn default_fallback() -> Handler {
    Box::new(|_request, _params| {
        let mut response = Response::with_blob(Status::NotFound, Vec::new());
        response.headers_mut().set("Content-Type", "*/*");
        response.headers_mut().set("Content-Length", "0");
        response
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn request(bytes: &[u8]) -> Request {
        crate::http::request::parse(&mut Cursor::new(bytes.to_vec()), &crate::limits::ReqLimits::default())
            .unwrap()
    }

    #[test]
    fn missing_host_on_http11_is_bad_request() {
        let routes = Routes::new("localhost:8080", default_fallback());
        let req = request(b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(routes.dispatch_handler(req).status(), Status::BadRequest);
    }

    #[test]
    fn mismatched_host_is_bad_request() {
        let routes = Routes::new("localhost:8080", default_fallback());
        let req = request(b"GET / HTTP/1.1\r\nHost: example.com:8080\r\n\r\n");
        assert_eq!(routes.dispatch_handler(req).status(), Status::BadRequest);
    }

    #[test]
    fn name_only_host_matches_when_no_port_given() {
        let routes = Routes::new("localhost", default_fallback());
        let req = request(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
        assert_eq!(routes.dispatch_handler(req).status(), Status::NotFound);
    }

    #[test]
    fn unregistered_path_falls_back_to_404() {
        let routes = Routes::new("localhost:8080", default_fallback());
        let req = request(b"GET /missing HTTP/1.1\r\nHost: localhost:8080\r\n\r\n");
        assert_eq!(routes.dispatch_handler(req).status(), Status::NotFound);
    }

    #[test]
    fn registered_path_is_dispatched() {
        let mut routes = Routes::new("localhost:8080", default_fallback());
        let registered = routes.register(
            "/",
            Box::new(|_req, _params| Response::with_blob(Status::Ok, b"hi".to_vec())),
        );
        assert!(registered);

        let req = request(b"GET / HTTP/1.1\r\nHost: localhost:8080\r\n\r\n");
        assert_eq!(routes.dispatch_handler(req).status(), Status::Ok);
    }

    #[test]
    fn duplicate_registration_is_refused() {
        let mut routes = Routes::new("localhost:8080", default_fallback());
        assert!(routes.register("/", Box::new(|_req, _params| Response::new(Status::Ok))));
        assert!(!routes.register("/", Box::new(|_req, _params| Response::new(Status::Ok))));
    }
}
