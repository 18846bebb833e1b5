//! A single POST handler that echoes the request body back, grounded on
//! `main.cpp`'s `/` (POST branch) and spec.md §8 scenario 6.
//!
//! Run with `cargo run --example echo <port> <backlog>`.

use derkhttpd::{
    dispatcher::{self, Dispatcher, RUNNING},
    http::{request::Request, types::{Status, Verb}, uri::QueryValue},
    limits::ServerLimits,
    net,
    resource::{full_response, EmptyReply, StringReply},
    routes::{default_fallback, Routes},
    Response,
};
use std::process::ExitCode;

fn echo_handler(request: Request, _params: &[(String, QueryValue)]) -> Response {
    if request.verb() != Verb::Post {
        return full_response(Box::new(EmptyReply::new(Status::MethodNotAllowed)), Status::MethodNotAllowed);
    }

    let reply = StringReply::new(request.body().to_vec(), "text/plain");
    full_response(Box::new(reply), Status::Ok)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: echo <port> <backlog>");
        return ExitCode::FAILURE;
    }

    let (Ok(port), Ok(backlog)) = (args[1].parse::<u16>(), args[2].parse::<i32>()) else {
        eprintln!("startup error: port/backlog must be integers");
        return ExitCode::FAILURE;
    };

    dispatcher::install_sigint_handler();

    let Some(listener) = net::listener::bind(port, backlog) else {
        eprintln!("startup error: failed to bind a listener on port {port}");
        return ExitCode::FAILURE;
    };

    let mut routes = Routes::new(&format!("localhost:{port}"), default_fallback());
    routes.register("/", Box::new(echo_handler));

    let limits = ServerLimits { backlog, ..ServerLimits::default() };
    Dispatcher::new(listener, routes, limits).run(&RUNNING);

    ExitCode::SUCCESS
}
