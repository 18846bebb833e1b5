//! Error taxonomy shared by intake, outtake, and the URI parser.
//!
//! Follows spec.md §7: *syntax*, *constraint*, and *I/O* failures all
//! collapse to a single top-level [`Error`] that the dispatcher treats as
//! terminal for the connection. There is no JSON error-body feature here —
//! the reference server writes a short message to stderr and closes the
//! socket, matching `myhttp/intake.cpp`'s `std::unexpected` trail.

use std::{fmt, io};

/// Where in the request lifecycle a failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    /// Malformed request line, header, chunk prefix, URI, or date.
    Syntax,
    /// Header line or body exceeded a configured limit.
    Constraint,
    /// A read or write failed, or the peer closed mid-message.
    Io,
}

/// A single intake/outtake/URI failure, carrying enough context to log but
/// deliberately not enough to build a response body from (per spec.md §7,
/// these always end in connection close, never a crafted error page).
#[derive(Debug)]
pub(crate) struct Error {
    pub(crate) kind: Kind,
    pub(crate) message: String,
}

impl Error {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self {
            kind: Kind::Syntax,
            message: message.into(),
        }
    }

    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        Self {
            kind: Kind::Constraint,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self {
            kind: Kind::Io,
            message: err.to_string(),
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
