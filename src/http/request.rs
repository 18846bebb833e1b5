//! Request representation and the incremental intake state machine
//! (spec.md §3, §4.3).
//!
//! Grounded on `myhttp/intake.cpp`'s `HttpIntake::operator()`: the same
//! `request_line -> header* -> choose_body_mode -> {simple_body|chunk} ->
//! done` progression, reimplemented over owned buffers instead of the
//! original's `std::string_view`s into a shared scratch buffer. Two
//! corrections versus the original (recorded in DESIGN.md): header keys
//! and values are both fully trimmed (the original only skipped one space
//! after the colon), and chunked bodies are bounded by `max_body_size` as a
//! running total (spec.md §9 Open Questions). Header-line colon scanning
//! uses `memchr`, the same delimiter-scanning crate the teacher's own
//! `http/query.rs` and `http/request.rs` reach for.

use crate::{
    errors::Error,
    http::types::{HeaderMap, Schema, Verb},
    limits::{ReqLimits, MAX_HEADER_LINE},
    net::io::{self, ByteBuffer},
};
use std::io::Read;

/// One parsed HTTP request, owned end to end (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    verb: Verb,
    uri: String,
    schema: Schema,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Request {
    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Rewrites the verb for dispatch purposes (spec.md §4.7 step 3: "If
    /// verb is HEAD, rewrite verb to GET for dispatch purposes").
    pub(crate) fn set_verb(&mut self, verb: Verb) {
        self.verb = verb;
    }
}

/// Drives the full intake state machine to completion over `stream`,
/// producing one [`Request`] or a terminal [`Error`].
pub(crate) fn parse<R: Read>(stream: &mut R, limits: &ReqLimits) -> Result<Request, Error> {
    let mut buf = io::new_buffer();

    let (verb, uri, schema) = parse_request_line(stream, &mut buf)?;
    let headers = parse_headers(stream, &mut buf, limits)?;
    let body = parse_body(stream, &mut buf, &headers, limits)?;

    Ok(Request { verb, uri, schema, headers, body })
}

fn parse_request_line<R: Read>(
    stream: &mut R,
    buf: &mut ByteBuffer,
) -> Result<(Verb, String, Schema), Error> {
    let n = io::read_line(stream, buf)?;
    if n == 0 {
        return Err(Error::constraint("Connection closed before a request line arrived"));
    }

    let line = std::str::from_utf8(&buf[..n])
        .map_err(|_| Error::syntax("Request line is not valid UTF-8"))?;

    let mut lexemes = line.split_whitespace();
    let verb_lexeme = lexemes.next().ok_or_else(|| Error::syntax("Empty request line"))?;
    let path = lexemes.next().ok_or_else(|| Error::syntax("Request line is missing a path"))?;
    let schema_lexeme = lexemes.next().unwrap_or("HTTP/1.1");

    Ok((Verb::parse(verb_lexeme), path.to_string(), Schema::parse(schema_lexeme)))
}

fn parse_headers<R: Read>(
    stream: &mut R,
    buf: &mut ByteBuffer,
    limits: &ReqLimits,
) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();

    for _ in 0..=limits.max_headers {
        let n = io::read_line(stream, buf)?;
        if n > MAX_HEADER_LINE {
            return Err(Error::constraint("Invalid request header / body sizing!"));
        }
        if n == 0 {
            return Ok(headers);
        }

        let line = std::str::from_utf8(&buf[..n])
            .map_err(|_| Error::syntax("Header line is not valid UTF-8"))?;

        let Some(colon) = memchr::memchr(b':', line.as_bytes()) else {
            // No colon at all reads the same as the blank-line terminator;
            // the original treats it identically (`check_end_of_headers`).
            return Ok(headers);
        };

        let key = line[..colon].trim();
        let value = line[colon + 1..].trim();
        if key.is_empty() || value.is_empty() {
            return Ok(headers);
        }

        headers.set(key, value);
    }

    Err(Error::constraint("Too many header lines"))
}

fn parse_body<R: Read>(
    stream: &mut R,
    buf: &mut ByteBuffer,
    headers: &HeaderMap,
    limits: &ReqLimits,
) -> Result<Vec<u8>, Error> {
    let chunked = headers
        .get("Transfer-Encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));

    if chunked {
        parse_chunked_body(stream, buf, limits)
    } else {
        parse_simple_body(stream, buf, headers, limits)
    }
}

fn parse_simple_body<R: Read>(
    stream: &mut R,
    buf: &mut ByteBuffer,
    headers: &HeaderMap,
    limits: &ReqLimits,
) -> Result<Vec<u8>, Error> {
    let len = match headers.get("Content-Length") {
        Some(v) => v
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::syntax("Content-Length is not a valid integer"))?,
        None => 0,
    };

    if len > limits.max_body_size {
        return Err(Error::constraint("Invalid request header / body sizing!"));
    }

    let mut body = Vec::with_capacity(len);
    let mut remaining = len;

    while remaining > 0 {
        let want = remaining.min(buf.len());
        let n = io::read_n(stream, want, buf)?;
        if n == 0 {
            return Err(Error::constraint("Connection closed before the body completed"));
        }
        body.extend_from_slice(&buf[..n]);
        remaining -= n;
    }

    Ok(body)
}

fn parse_chunked_body<R: Read>(
    stream: &mut R,
    buf: &mut ByteBuffer,
    limits: &ReqLimits,
) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();

    loop {
        let n = io::read_line(stream, buf)?;
        let lexeme = std::str::from_utf8(&buf[..n])
            .map_err(|_| Error::syntax("Chunk length is not valid UTF-8"))?;
        let len = usize::from_str_radix(lexeme.trim(), 16)
            .map_err(|_| Error::syntax("Malformed chunk length"))?;

        if body.len() + len > limits.max_body_size {
            return Err(Error::constraint("Invalid request header / body sizing!"));
        }

        if len == 0 {
            io::read_line(stream, buf)?;
            return Ok(body);
        }

        let mut remaining = len;
        while remaining > 0 {
            let want = remaining.min(buf.len());
            let got = io::read_n(stream, want, buf)?;
            if got == 0 {
                return Err(Error::constraint("Connection closed mid-chunk"));
            }
            body.extend_from_slice(&buf[..got]);
            remaining -= got;
        }

        io::read_line(stream, buf)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_a_simple_get() {
        let mut src = Cursor::new(b"GET /a?x=1 HTTP/1.1\r\nHost: localhost:8080\r\n\r\n".to_vec());
        let req = parse(&mut src, &ReqLimits::default()).unwrap();

        assert_eq!(req.verb(), Verb::Get);
        assert_eq!(req.uri(), "/a?x=1");
        assert_eq!(req.schema(), Schema::Http11);
        assert_eq!(req.headers().get("Host"), Some("localhost:8080"));
        assert!(req.body().is_empty());
    }

    #[test]
    fn parses_a_content_length_body() {
        let mut src = Cursor::new(
            b"POST /up HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello".to_vec(),
        );
        let req = parse(&mut src, &ReqLimits::default()).unwrap();

        assert_eq!(req.verb(), Verb::Post);
        assert_eq!(req.body(), b"hello");
    }

    #[test]
    fn parses_a_chunked_body() {
        let mut src = Cursor::new(
            b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n"
                .to_vec(),
        );
        let req = parse(&mut src, &ReqLimits::default()).unwrap();

        assert_eq!(req.body(), b"hello world");
    }

    #[test]
    fn rejects_body_over_the_configured_limit() {
        let mut src = Cursor::new(b"POST / HTTP/1.1\r\nContent-Length: 99999\r\n\r\n".to_vec());
        let err = parse(&mut src, &ReqLimits::default()).unwrap_err();
        assert_eq!(err.kind, crate::errors::Kind::Constraint);
    }

    #[test]
    fn unknown_verb_defaults_to_get() {
        let mut src = Cursor::new(b"TRACE / HTTP/1.1\r\n\r\n".to_vec());
        let req = parse(&mut src, &ReqLimits::default()).unwrap();
        assert_eq!(req.verb(), Verb::Get);
    }

    #[test]
    fn header_keys_and_values_are_fully_trimmed() {
        let mut src = Cursor::new(b"GET / HTTP/1.1\r\n  Host  :   localhost  \r\n\r\n".to_vec());
        let req = parse(&mut src, &ReqLimits::default()).unwrap();
        assert_eq!(req.headers().get("Host"), Some("localhost"));
    }

    #[test]
    fn set_verb_rewrites_head_to_get() {
        let mut src = Cursor::new(b"HEAD / HTTP/1.1\r\n\r\n".to_vec());
        let mut req = parse(&mut src, &ReqLimits::default()).unwrap();
        assert_eq!(req.verb(), Verb::Head);
        req.set_verb(Verb::Get);
        assert_eq!(req.verb(), Verb::Get);
    }
}
