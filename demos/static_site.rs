//! Serves `./www/index.html` and `./www/index.js` as a tiny static site,
//! grounded on `main.cpp`'s `/` (GET branch) and `/index.js` handlers.
//!
//! Run with `cargo run --example static_site <port> <backlog>`.

use derkhttpd::{
    dispatcher::{self, Dispatcher, RUNNING},
    http::{request::Request, types::Status, uri::QueryValue},
    limits::ServerLimits,
    net,
    resource::{full_response, EmptyReply, TextualFile},
    routes::{default_fallback, Routes},
    Response,
};
use std::process::ExitCode;

fn index_handler(_request: Request, _params: &[(String, QueryValue)]) -> Response {
    match TextualFile::open("./www/index.html", "text/html", 512) {
        Ok(file) => full_response(Box::new(file), Status::Ok),
        Err(_) => full_response(Box::new(EmptyReply::new(Status::NotFound)), Status::NotFound),
    }
}

fn script_handler(_request: Request, _params: &[(String, QueryValue)]) -> Response {
    match TextualFile::open("./www/index.js", "text/javascript", 512) {
        Ok(file) => full_response(Box::new(file), Status::Ok),
        Err(_) => full_response(Box::new(EmptyReply::new(Status::NotFound)), Status::NotFound),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: static_site <port> <backlog>");
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
    routes.register("/", Box::new(index_handler));
    routes.register("/index.js", Box::new(script_handler));

    let limits = ServerLimits { backlog, ..ServerLimits::default() };
    Dispatcher::new(listener, routes, limits).run(&RUNNING);

    ExitCode::SUCCESS
}
