//! Loopback integration tests driving a real `TcpListener` through the
//! scenarios in spec.md §8, using only `std::net` (no test-harness crate,
//! matching the teacher's own testing style).

use derkhttpd::{
    dispatcher::Dispatcher,
    http::types::Status,
    limits::ServerLimits,
    resource::{full_response, EmptyReply, StringReply},
    routes::Routes,
    Response,
};
use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    thread,
    time::Duration,
};

/// Binds an ephemeral loopback listener, hands it to a background-ticking
/// dispatcher built from `routes_for(addr)`, and returns the address
/// clients should connect to. `routes_for` receives the listener's actual
/// bound address so the registered `Routes` host matches what the client
/// sends in its `Host` header.
fn spawn_server(routes_for: impl FnOnce(SocketAddr) -> Routes) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has no local addr");
    let routes = routes_for(addr);

    let mut limits = ServerLimits::default();
    limits.conn.poll_timeout = Duration::from_millis(10);

    thread::spawn(move || {
        let mut dispatcher = Dispatcher::new(listener, routes, limits);
        dispatcher.run_ticks(200);
    });

    // Give the background thread a moment to enter its first poll.
    thread::sleep(Duration::from_millis(20));
    addr
}

fn send_and_read(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).expect("failed to connect to loopback server");
    stream.write_all(request).unwrap();
    stream.set_read_timeout(Some(Duration::from_millis(500))).unwrap();

    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => response.extend_from_slice(&buf[..n]),
            Err(_) => break,
        }
    }

    String::from_utf8_lossy(&response).into_owned()
}

fn hello_routes(addr: SocketAddr) -> Routes {
    let mut routes = Routes::new(&addr.to_string(), derkhttpd::routes::default_fallback());
    routes.register(
        "/",
        Box::new(|_req, _params| {
            let reply = StringReply::new(b"hello world".to_vec(), "text/plain");
            full_response(Box::new(reply), Status::Ok)
        }),
    );
    routes
}

#[test]
fn scenario_1_simple_get_returns_the_handlers_body() {
    let addr = spawn_server(hello_routes);
    let response = send_and_read(addr, format!("GET / HTTP/1.1\r\nHost: {addr}\r\n\r\n").as_bytes());

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Length: 11\r\n"));
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert!(response.contains("Connection: close\r\n"));
    assert!(response.contains("Server: derkhttpd/"));
    assert!(response.ends_with("hello world"));
}

#[test]
fn scenario_2_head_request_has_an_empty_body() {
    let addr = spawn_server(hello_routes);
    let response = send_and_read(addr, format!("HEAD / HTTP/1.1\r\nHost: {addr}\r\n\r\n").as_bytes());

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Length: 11\r\n"));
    assert!(response.ends_with("\r\n\r\n"));
}

#[test]
fn scenario_3_unregistered_path_falls_back_to_404() {
    let addr = spawn_server(hello_routes);
    let response =
        send_and_read(addr, format!("GET /missing HTTP/1.1\r\nHost: {addr}\r\n\r\n").as_bytes());

    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(response.contains("Content-Length: 0\r\n"));
}

#[test]
fn scenario_4_missing_host_on_http11_is_bad_request() {
    let addr = spawn_server(hello_routes);
    let response = send_and_read(addr, b"GET / HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn scenario_6_chunked_post_body_is_reassembled_and_echoed() {
    let addr = spawn_server(|addr| {
        let mut routes = Routes::new(&addr.to_string(), derkhttpd::routes::default_fallback());
        routes.register(
            "/",
            Box::new(|req: derkhttpd::Request, _params| -> Response {
                let reply = StringReply::new(req.body().to_vec(), "text/plain");
                full_response(Box::new(reply), Status::Ok)
            }),
        );
        routes
    });

    let request = format!(
        "POST / HTTP/1.1\r\nHost: {addr}\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n"
    );
    let response = send_and_read(addr, request.as_bytes());

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Length: 11\r\n"));
    assert!(response.ends_with("hello world"));
}

#[test]
fn scenario_7_query_parameters_are_typed() {
    let addr = spawn_server(|addr| {
        let mut routes = Routes::new(&addr.to_string(), derkhttpd::routes::default_fallback());
        routes.register(
            "/a",
            Box::new(|_req, params: &[(String, derkhttpd::QueryValue)]| -> Response {
                let x = params.iter().find(|(n, _)| n == "x").map(|(_, v)| v);
                let y = params.iter().find(|(n, _)| n == "y").map(|(_, v)| v);
                let ok = matches!(x, Some(derkhttpd::QueryValue::Int(1)))
                    && matches!(y, Some(derkhttpd::QueryValue::Str(s)) if s == "hi");

                if ok {
                    full_response(Box::new(StringReply::new(b"ok".to_vec(), "text/plain")), Status::Ok)
                } else {
                    full_response(Box::new(EmptyReply::new(Status::BadRequest)), Status::BadRequest)
                }
            }),
        );
        routes
    });

    let response =
        send_and_read(addr, format!("GET /a?x=1&y=hi HTTP/1.1\r\nHost: {addr}\r\n\r\n").as_bytes());

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
}
