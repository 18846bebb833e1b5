//! Response representation and the outtake serializer (spec.md §3, §4.4).
//!
//! Grounded on `myhttp/msgs.hpp` (`HttpResponse`, `ChunkIterBase`) for the
//! data model and `myhttp/outtake.cpp` (`HttpOuttake::operator()`) for the
//! three-phase write. One correction versus the original (recorded in
//! DESIGN.md): the original's body-write step reports failure whenever the
//! write call returns 0 bytes sent, which misfires for a deliberately empty
//! or absent body (304, 412, HEAD, `EmptyReply`) — here, a zero-byte body
//! is always a success.

use crate::{
    errors::Error,
    http::types::{HeaderMap, Schema, Status},
    net::io::{self, ByteBuffer},
};
use std::io::Write;

/// A producer of successive body fragments (spec.md §3: "ChunkIterator").
/// An empty fragment from `next` marks end-of-stream. `clear` must be
/// idempotent — it is the mechanism HEAD handling uses to release a file
/// handle without re-running the handler (spec.md §4.7 step 4).
pub trait ChunkIterator: Send {
    fn next(&mut self) -> Result<Vec<u8>, Error>;
    fn clear(&mut self);
}

/// The response body, a tagged union over {Blob, chunk-iterator, absent}
/// (spec.md §3, §9 "Polymorphic body").
pub enum Body {
    Blob(Vec<u8>),
    Chunks(Box<dyn ChunkIterator>),
    Absent,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Blob(blob) => blob.is_empty(),
            Body::Chunks(_) => false,
            Body::Absent => true,
        }
    }
}

/// One outgoing HTTP response (spec.md §3).
pub struct Response {
    status: Status,
    schema: Schema,
    headers: HeaderMap,
    body: Body,
    /// Resource-modification timestamp, consulted only by the
    /// message-exchange task's conditional-caching logic (spec.md §4.7
    /// step 5); handlers set it, nothing else reads it.
    modify_timestamp: Option<i64>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            schema: Schema::Http11,
            headers: HeaderMap::new(),
            body: Body::Absent,
            modify_timestamp: None,
        }
    }

    pub fn with_blob(status: Status, blob: impl Into<Vec<u8>>) -> Self {
        Self { body: Body::Blob(blob.into()), ..Self::new(status) }
    }

    pub fn with_chunks(status: Status, chunks: Box<dyn ChunkIterator>) -> Self {
        Self { body: Body::Chunks(chunks), ..Self::new(status) }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn modify_timestamp(&self) -> Option<i64> {
        self.modify_timestamp
    }

    pub fn set_modify_timestamp(&mut self, seconds_since_epoch: i64) {
        self.modify_timestamp = Some(seconds_since_epoch);
    }

    /// Discards whatever body is present, for HEAD requests (spec.md §4.7
    /// step 4): a chunk iterator is told to release its resources, a blob
    /// is replaced with an empty one. Absent stays absent.
    pub(crate) fn discard_body_for_head(&mut self) {
        match &mut self.body {
            Body::Blob(blob) => blob.clear(),
            Body::Chunks(chunks) => chunks.clear(),
            Body::Absent => {}
        }
    }

    /// Rewrites this response into the 304/412 shape (spec.md §4.7 step 5):
    /// empty body, status replaced, every header dropped except
    /// `Last-Modified`.
    pub(crate) fn make_conditional_failure(&mut self, status: Status) {
        self.status = status;
        self.body = Body::Blob(Vec::new());
        self.headers.retain_only("Last-Modified");
    }
}

fn flush<W: Write>(stream: &mut W, buf: &mut ByteBuffer, bytes: &[u8]) -> Result<(), Error> {
    if bytes.len() > buf.len() {
        return Err(Error::constraint("Failed to encode a server-made header"));
    }
    buf.fill(0);
    buf[..bytes.len()].copy_from_slice(bytes);
    io::write_n(stream, bytes.len(), buf)?;
    Ok(())
}

fn write_blob<W: Write>(stream: &mut W, buf: &mut ByteBuffer, blob: &[u8]) -> Result<(), Error> {
    let mut offset = 0;
    while offset < blob.len() {
        let chunk_len = (blob.len() - offset).min(buf.len());
        buf[..chunk_len].copy_from_slice(&blob[offset..offset + chunk_len]);
        io::write_n(stream, chunk_len, buf)?;
        offset += chunk_len;
    }
    Ok(())
}

/// Serializes `response` onto `stream`: status line, headers, then body
/// (spec.md §4.4). Takes `response` by mutable reference because draining
/// a [`ChunkIterator`] body requires `&mut`.
pub(crate) fn write<W: Write>(stream: &mut W, response: &mut Response) -> Result<(), Error> {
    let mut buf = io::new_buffer();

    let status_line = format!(
        "{} {} {}\r\n",
        response.schema.as_str(),
        response.status.code(),
        response.status.reason()
    );
    flush(stream, &mut buf, status_line.as_bytes())?;

    for (name, value) in response.headers.iter() {
        flush(stream, &mut buf, format!("{name}: {value}\r\n").as_bytes())?;
    }
    flush(stream, &mut buf, b"\r\n")?;

    match &mut response.body {
        Body::Blob(blob) => write_blob(stream, &mut buf, blob)?,
        Body::Chunks(chunks) => write_chunked(stream, &mut buf, chunks.as_mut())?,
        Body::Absent => {}
    }

    Ok(())
}

fn write_chunked<W: Write>(
    stream: &mut W,
    buf: &mut ByteBuffer,
    chunks: &mut dyn ChunkIterator,
) -> Result<(), Error> {
    loop {
        let fragment = chunks.next()?;

        if fragment.is_empty() {
            flush(stream, buf, b"0\r\n\r\n")?;
            return Ok(());
        }

        flush(stream, buf, format!("{:x}\r\n", fragment.len()).as_bytes())?;
        write_blob(stream, buf, &fragment)?;
        flush(stream, buf, b"\r\n")?;
    }
}
