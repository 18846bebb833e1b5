//! Fixed-buffer blocking socket I/O (spec.md §4.1).
//!
//! Direct port of `mynet/io_funcs.cpp`'s `socket_read_n` / `socket_read_line`
//! / `socket_write_n`. Each connection owns one [`ByteBuffer`]; none of
//! these functions allocate.

use crate::{errors::Error, limits::SOCKET_BUFFER_CAPACITY};
use std::io::{ErrorKind as IoErrorKind, Read, Write};

/// The fixed-capacity scratch buffer a worker reuses for an entire request.
pub(crate) type ByteBuffer = [u8; SOCKET_BUFFER_CAPACITY];

pub(crate) fn new_buffer() -> ByteBuffer {
    [0u8; SOCKET_BUFFER_CAPACITY]
}

/// Reads up to `n` bytes (capped at the buffer capacity) into `dest`,
/// looping over short reads. Returns `0` on clean EOF, otherwise the
/// number of bytes read.
pub(crate) fn read_n<R: Read>(src: &mut R, n: usize, dest: &mut ByteBuffer) -> Result<usize, Error> {
    dest.fill(0);

    let want = n.min(dest.len());
    let mut done = 0usize;

    while done < want {
        match src.read(&mut dest[done..want]) {
            Ok(0) => return Ok(0),
            Ok(k) => done += k,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(done)
}

/// Reads one line terminated by LF, discarding any CR bytes and replacing
/// the LF with a NUL terminator in `dest`. Fails if no LF appears within
/// the buffer's capacity. Returns the number of retained bytes (excluding
/// the terminator).
pub(crate) fn read_line<R: Read>(src: &mut R, dest: &mut ByteBuffer) -> Result<usize, Error> {
    dest.fill(0);

    let mut done = 0usize;
    let mut byte = [0u8; 1];

    while done < dest.len() {
        match src.read(&mut byte) {
            Ok(0) => return Ok(0),
            Ok(_) => match byte[0] {
                b'\r' => continue,
                b'\n' => {
                    dest[done] = 0;
                    return Ok(done);
                }
                b => {
                    dest[done] = b;
                    done += 1;
                }
            },
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::constraint("Message line too large"))
}

/// Writes exactly `n` bytes from `src[..n]`, looping over short writes.
pub(crate) fn write_n<W: Write>(dst: &mut W, n: usize, src: &ByteBuffer) -> Result<usize, Error> {
    let mut done = 0usize;

    while done < n {
        match dst.write(&src[done..n]) {
            Ok(0) => return Ok(done),
            Ok(k) => done += k,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_n_reads_exact_count() {
        let mut src = Cursor::new(b"hello world".to_vec());
        let mut buf = new_buffer();

        let n = read_n(&mut src, 5, &mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf[..5], b"hello");
    }

    #[test]
    fn read_n_caps_at_capacity() {
        let mut src = Cursor::new(vec![b'x'; 4096]);
        let mut buf = new_buffer();

        let n = read_n(&mut src, 4096, &mut buf).unwrap();
        assert_eq!(n, SOCKET_BUFFER_CAPACITY);
    }

    #[test]
    fn read_n_reports_clean_eof() {
        let mut src = Cursor::new(Vec::new());
        let mut buf = new_buffer();

        let n = read_n(&mut src, 10, &mut buf).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn read_line_strips_cr_and_terminates_on_lf() {
        let mut src = Cursor::new(b"GET / HTTP/1.1\r\nrest".to_vec());
        let mut buf = new_buffer();

        let n = read_line(&mut src, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"GET / HTTP/1.1");
        assert_eq!(buf[n], 0);
    }

    #[test]
    fn read_line_fails_without_lf_within_capacity() {
        let mut src = Cursor::new(vec![b'a'; SOCKET_BUFFER_CAPACITY + 10]);
        let mut buf = new_buffer();

        assert!(read_line(&mut src, &mut buf).is_err());
    }

    #[test]
    fn write_n_writes_requested_slice() {
        let mut dst = Vec::new();
        let mut buf = new_buffer();
        buf[..5].copy_from_slice(b"hello");

        let n = write_n(&mut dst, 5, &buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&dst, b"hello");
    }
}
