//! Body-source abstractions (spec.md §4.5).
//!
//! Grounded on `myapp/contents.hpp`/`.cpp`: `TextualFile` wraps an open
//! file handle plus a MIME literal and chunk size; `StringReply` wraps an
//! owned byte buffer; `EmptyReply` carries only a status. One correction
//! versus the original (recorded in DESIGN.md): `TextualFile::create`'s
//! validity check there is `!is_relative() && !has_filename()` — true
//! only when *both* conditions hold — which lets an absolute path with a
//! filename through. Per spec.md §4.5 ("fails if the path is absolute or
//! missing a filename") this is an OR, enforced below.

use crate::{
    errors::Error,
    http::response::{ChunkIterator, Response},
    http::types::Status,
};
use std::{
    fs::File,
    io::Read,
    path::Path,
    time::SystemTime,
};

/// The capability set required of any response body source (spec.md §3
/// "Resource").
pub trait Resource {
    /// A static MIME descriptor, e.g. `"text/plain"`.
    fn mime(&self) -> &'static str;

    /// Reads the entire resource into memory.
    fn as_full_blob(self: Box<Self>) -> Result<Vec<u8>, Error>;

    /// Produces a lazy chunk iterator, or `None` if this resource has no
    /// streaming representation.
    fn as_chunk_iter(self: Box<Self>) -> Result<Option<Box<dyn ChunkIterator>>, Error>;
}

/// A resource backed by an already-open file handle.
pub struct TextualFile {
    file: File,
    mime: &'static str,
    chunk_len: usize,
}

impl TextualFile {
    /// Opens `relative_path` for reading. Fails if the path is absolute,
    /// names no file, or cannot be opened.
    pub fn open(relative_path: impl AsRef<Path>, mime: &'static str, chunk_len: usize) -> Result<Self, Error> {
        let path = relative_path.as_ref();

        if path.is_absolute() || path.file_name().is_none() {
            return Err(Error::constraint("TextualFile path must be relative and name a file"));
        }

        let file = File::open(path)?;
        Ok(Self { file, mime, chunk_len })
    }

    /// The file's last-modified time, as seconds since the Unix epoch.
    pub fn get_modify_time(&self) -> Result<i64, Error> {
        let modified = self.file.metadata()?.modified()?;
        let seconds = modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| Error::constraint("File modification time predates the epoch"))?
            .as_secs();

        Ok(seconds as i64)
    }
}

impl Resource for TextualFile {
    fn mime(&self) -> &'static str {
        self.mime
    }

    fn as_full_blob(self: Box<Self>) -> Result<Vec<u8>, Error> {
        let mut file = self.file;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn as_chunk_iter(self: Box<Self>) -> Result<Option<Box<dyn ChunkIterator>>, Error> {
        Ok(Some(Box::new(FileChunks { file: Some(self.file), chunk_len: self.chunk_len })))
    }
}

struct FileChunks {
    file: Option<File>,
    chunk_len: usize,
}

impl ChunkIterator for FileChunks {
    fn next(&mut self) -> Result<Vec<u8>, Error> {
        let Some(file) = self.file.as_mut() else {
            return Ok(Vec::new());
        };
        if self.chunk_len == 0 {
            self.file = None;
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; self.chunk_len];
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        buf.truncate(filled);

        if buf.is_empty() {
            self.file = None;
        }
        Ok(buf)
    }

    fn clear(&mut self) {
        self.file = None;
        self.chunk_len = 0;
    }
}

/// A resource backed by an owned byte sequence, e.g. a handler-built
/// string or an echoed request body.
pub struct StringReply {
    data: Vec<u8>,
    mime: &'static str,
}

impl StringReply {
    pub fn new(data: impl Into<Vec<u8>>, mime: &'static str) -> Self {
        Self { data: data.into(), mime }
    }
}

impl Resource for StringReply {
    fn mime(&self) -> &'static str {
        self.mime
    }

    fn as_full_blob(self: Box<Self>) -> Result<Vec<u8>, Error> {
        Ok(self.data)
    }

    fn as_chunk_iter(self: Box<Self>) -> Result<Option<Box<dyn ChunkIterator>>, Error> {
        Ok(None)
    }
}

/// A status-only resource with no body at all.
pub struct EmptyReply {
    status: Status,
}

impl EmptyReply {
    pub fn new(status: Status) -> Self {
        Self { status }
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

impl Resource for EmptyReply {
    fn mime(&self) -> &'static str {
        "*/*"
    }

    fn as_full_blob(self: Box<Self>) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }

    fn as_chunk_iter(self: Box<Self>) -> Result<Option<Box<dyn ChunkIterator>>, Error> {
        Ok(None)
    }
}

/// Builds a full-blob response from `resource` (`myapp/response_helpers.hpp`'s
/// `response_put_all`): body, `Content-Length`, `Content-Type`, and the
/// given status. The original also stamps a `Date` header here; that's
/// dropped since spec.md §6 reserves `Date` for the message-exchange task
/// ("Handlers MUST NOT set Server, Connection, or Date").
pub fn full_response(resource: Box<dyn Resource>, status: Status) -> Response {
    let mime = resource.mime();

    match resource.as_full_blob() {
        Ok(blob) => {
            let len = blob.len();
            let mut response = Response::with_blob(status, blob);
            response.headers_mut().set("Content-Length", len.to_string());
            response.headers_mut().set("Content-Type", mime);
            response
        }
        Err(_) => empty_response(Status::InternalServerError),
    }
}

/// Builds a chunked response from `resource` (`response_put_chunked`),
/// falling back to an empty 500 if the resource has no streaming
/// representation.
pub fn chunked_response(resource: Box<dyn Resource>) -> Response {
    let mime = resource.mime();

    match resource.as_chunk_iter() {
        Ok(Some(chunks)) => {
            let mut response = Response::with_chunks(Status::Ok, chunks);
            response.headers_mut().set("Content-Type", mime);
            response.headers_mut().set("Transfer-Encoding", "chunked");
            response
        }
        _ => empty_response(Status::InternalServerError),
    }
}

fn empty_response(status: Status) -> Response {
    let mut response = Response::with_blob(status, Vec::new());
    response.headers_mut().set("Content-Length", "0");
    response.headers_mut().set("Content-Type", "*/*");
    response
}
