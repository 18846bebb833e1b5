//! The message-exchange task: one request/response round trip (spec.md
//! §4.7).
//!
//! Grounded on `myapp/msg_task.hpp` for the task shape and
//! `myapp/response_helpers.cpp`'s `get_date_string`/`parse_date_string`
//! for date handling — the conditional-caching branch itself (steps 2 and
//! 5) and the `Server`/`Connection`/`Date` injection (step 6) are authored
//! from spec.md §4.7 directly, since the retrieved `msg_task.hpp` doesn't
//! show that logic. One deliberate divergence: the reference format
//! string ends in `UTC` where the `httpdate` crate (not a teacher
//! dependency, pulled in for this conversion — see DESIGN.md) always
//! writes `GMT` — we swap the trailing token after formatting rather than
//! hand-roll a date formatter. A second divergence resolves spec.md §9's
//! Open Question on `Connection` comparisons: matching is
//! case-insensitive here. A third point, confirmed against scenario 1 in
//! spec.md §8: "copy verbatim" with no `Connection` header to copy falls
//! through to `close`, not a keep-alive default. Intake and outtake
//! failures are logged to stderr before the connection closes, matching
//! `msg_task.hpp:37`'s `std::println(std::cerr, "MsgExchangeTask
//! ERROR:\n{}", ...)`.

use crate::{
    http::{
        request::{self, Request},
        response::{self, Response},
        types::{Schema, Status, Verb},
    },
    limits::ReqLimits,
    routes::Routes,
};
use std::{
    io::{Read, Write},
    time::{Duration, SystemTime},
};

enum Tag {
    Minimum,
    Maximum,
    None,
}

struct ConditionalBound {
    time: i64,
    tag: Tag,
}

fn epoch_seconds_now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn parse_http_date_seconds(value: &str) -> Option<i64> {
    let time = httpdate::parse_http_date(value).ok()?;
    let seconds = time.duration_since(SystemTime::UNIX_EPOCH).ok()?.as_secs();
    Some(seconds as i64)
}

/// Formats seconds-since-epoch as `%a, %e %b %Y %H:%M:%S UTC` (spec.md §6).
fn format_date_utc(seconds_since_epoch: i64) -> String {
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(seconds_since_epoch.max(0) as u64);
    let rfc1123 = httpdate::fmt_http_date(time);
    format!("{}UTC", &rfc1123[..rfc1123.len() - 3])
}

fn conditional_bound(request: &Request, verb: Verb) -> ConditionalBound {
    if matches!(verb, Verb::Get | Verb::Head) {
        if let Some(value) = request.headers().get("If-Modified-Since") {
            if let Some(time) = parse_http_date_seconds(value) {
                return ConditionalBound { time, tag: Tag::Minimum };
            }
        }
    } else if let Some(value) = request.headers().get("If-Unmodified-Since") {
        if let Some(time) = parse_http_date_seconds(value) {
            return ConditionalBound { time, tag: Tag::Maximum };
        }
    }

    ConditionalBound { time: epoch_seconds_now(), tag: Tag::None }
}

fn apply_conditional_rewrite(response: &mut Response, bound: &ConditionalBound) {
    let Some(resource_time) = response.modify_timestamp() else {
        return;
    };

    let rewrite = match bound.tag {
        Tag::Minimum if resource_time <= bound.time => Some(Status::NotModified),
        Tag::Maximum if resource_time > bound.time => Some(Status::PreconditionFailed),
        _ => None,
    };

    if let Some(status) = rewrite {
        response.make_conditional_failure(status);
        response.headers_mut().set("Last-Modified", format_date_utc(resource_time));
    }
}

fn finalize_response(response: &mut Response, request_schema: Schema, request_connection: Option<&str>) {
    response.headers_mut().set("Server", concat!("derkhttpd/", env!("CARGO_PKG_VERSION")));

    let retains_connection = request_schema == Schema::Http11 && response.status() != Status::InternalServerError;
    let connection_value = match (retains_connection, request_connection) {
        (true, Some(value)) => value,
        _ => "close",
    };
    response.headers_mut().set("Connection", connection_value);

    response.headers_mut().set("Date", format_date_utc(epoch_seconds_now()));
    response.set_schema(request_schema);
}

fn keeps_connection_alive(response: &Response) -> bool {
    match response.headers().get("Connection") {
        Some(value) => !value.eq_ignore_ascii_case("close"),
        None => true,
    }
}

/// Drives one full request/response cycle over `stream`: intake, routing,
/// conditional-caching rewrite, header injection, outtake. Returns whether
/// the dispatcher should keep the connection open for another tick
/// (spec.md §4.7).
pub(crate) fn run<S: Read + Write>(stream: &mut S, routes: &Routes, limits: &ReqLimits) -> bool {
    let mut request = match request::parse(stream, limits) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("MsgExchangeTask ERROR:\n{err}");
            return false;
        }
    };

    let original_verb = request.verb();
    let request_schema = request.schema();
    let request_connection = request.headers().get("Connection").map(str::to_string);
    let bound = conditional_bound(&request, original_verb);

    if original_verb == Verb::Head {
        request.set_verb(Verb::Get);
    }

    let mut response = routes.dispatch_handler(request);

    if original_verb == Verb::Head {
        response.discard_body_for_head();
    }

    apply_conditional_rewrite(&mut response, &bound);
    finalize_response(&mut response, request_schema, request_connection.as_deref());

    match response::write(stream, &mut response) {
        Ok(()) => keeps_connection_alive(&response),
        Err(err) => {
            eprintln!("MsgExchangeTask ERROR:\n{err}");
            false
        }
    }
}
