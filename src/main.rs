//! Process entry point (spec.md §6 "CLI", §9 "Global running flag").
//!
//! Grounded on `main.cpp`: parse `<port> <backlog>`, install the SIGINT
//! handler, bind the listener, register the same `/` and `/index.js`
//! handlers, then run the dispatcher until the running flag clears. One
//! correction versus the original (recorded in DESIGN.md): a malformed
//! backlog argument there silently falls back to `1` via `value_or(1)`;
//! here it is a startup error like any other argument problem.

use derkhttpd::{
    dispatcher::{self, Dispatcher, RUNNING},
    http::{request::Request, types::{Status, Verb}},
    http::response::Response,
    http::uri::QueryValue,
    limits::ServerLimits,
    net,
    resource::{full_response, EmptyReply, StringReply, TextualFile},
    routes::{default_fallback, Routes},
};
use std::process::ExitCode;

fn index_handler(request: Request, _params: &[(String, QueryValue)]) -> Response {
    match request.verb() {
        Verb::Get => match TextualFile::open("./www/index.html", "text/html", 512) {
            Ok(file) => full_response(Box::new(file), Status::Ok),
            Err(_) => full_response(Box::new(EmptyReply::new(Status::InternalServerError)), Status::InternalServerError),
        },
        Verb::Post => {
            let reply = StringReply::new(request.body().to_vec(), "text/plain");
            full_response(Box::new(reply), Status::Ok)
        }
        _ => full_response(Box::new(EmptyReply::new(Status::MethodNotAllowed)), Status::MethodNotAllowed),
    }
}

fn script_handler(request: Request, _params: &[(String, QueryValue)]) -> Response {
    if request.verb() != Verb::Get {
        return full_response(Box::new(EmptyReply::new(Status::MethodNotAllowed)), Status::MethodNotAllowed);
    }

    match TextualFile::open("./www/index.js", "text/javascript", 512) {
        Ok(file) => full_response(Box::new(file), Status::Ok),
        Err(_) => full_response(Box::new(EmptyReply::new(Status::InternalServerError)), Status::InternalServerError),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        let program = args.first().map(String::as_str).unwrap_or("derkhttpd");
        eprintln!("usage: {program} <port> <backlog>");
        return ExitCode::FAILURE;
    }

    let Ok(port) = args[1].parse::<u16>() else {
        eprintln!("startup error: '{}' is not a valid port", args[1]);
        return ExitCode::FAILURE;
    };

    let Ok(backlog) = args[2].parse::<i32>() else {
        eprintln!("startup error: '{}' is not a valid backlog integer", args[2]);
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

    let mut dispatcher = Dispatcher::new(listener, routes, limits);
    dispatcher.run(&RUNNING);

    eprintln!("Event Loop LOG: Shutdown!");
    ExitCode::SUCCESS
}
