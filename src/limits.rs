//! Server configuration limits.
//!
//! Every tunable referenced throughout the crate lives in one of the small
//! `Copy` structs below, each with a documented reference default taken
//! from spec.md. Build one with [`ServerLimits::default`] and override only
//! the fields you need:
//!
//! ```
//! use derkhttpd::limits::{ReqLimits, ServerLimits};
//!
//! let limits = ServerLimits {
//!     req: ReqLimits {
//!         max_body_size: 4096,
//!         ..ReqLimits::default()
//!     },
//!     ..ServerLimits::default()
//! };
//! ```

use std::time::Duration;

/// Capacity of the fixed socket read/write buffer used by every connection
/// (spec.md §4.1: "capacity 512 is the reference value").
pub const SOCKET_BUFFER_CAPACITY: usize = 512;

/// Capacity of a single header line before the intake enters
/// `constraint_error` (spec.md §4.3: "reference: 480 bytes").
pub const MAX_HEADER_LINE: usize = 480;

/// Limits applied while reading and validating a single request.
#[derive(Debug, Clone, Copy)]
pub struct ReqLimits {
    /// Maximum `Content-Length` (or running chunked total) accepted for a
    /// request body before the intake fails with a constraint error
    /// (default: `1024`, matching the reference server's
    /// `MsgExchangeTask` construction rather than the library-wide 2048
    /// default documented in the original's `IntakeConfig`).
    pub max_body_size: usize,

    /// Maximum number of header lines accepted before the connection is
    /// treated as abusive. Not present in the C++ original; added so a
    /// client cannot stall a worker thread by streaming headers forever
    /// without ever sending the terminating blank line (default: `100`).
    pub max_headers: usize,
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            max_body_size: 1024,
            max_headers: 100,
        }
    }
}

/// Limits applied to one accepted TCP connection by the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct ConnLimits {
    /// How long [`poll`](libc::poll) blocks per dispatcher tick waiting for
    /// readable descriptors (spec.md §4.8: "reference: 15 ms").
    pub poll_timeout: Duration,

    /// Sleep applied when a tick reports zero ready descriptors, used as
    /// the lower bound of the adaptive backoff (spec.md §4.8's outer loop:
    /// "adaptive sleep stepping between 10 ms and 50 ms in 5 ms
    /// increments").
    pub idle_backoff_min: Duration,

    /// Upper bound of the adaptive idle backoff.
    pub idle_backoff_max: Duration,

    /// Step size applied each consecutive empty tick.
    pub idle_backoff_step: Duration,
}

impl Default for ConnLimits {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(15),
            idle_backoff_min: Duration::from_millis(10),
            idle_backoff_max: Duration::from_millis(50),
            idle_backoff_step: Duration::from_millis(5),
        }
    }
}

/// Top-level server configuration bundling the other limit groups plus the
/// listener's accept backlog.
#[derive(Debug, Clone, Copy)]
pub struct ServerLimits {
    /// Per-request limits, see [`ReqLimits`].
    pub req: ReqLimits,
    /// Per-connection dispatcher limits, see [`ConnLimits`].
    pub conn: ConnLimits,
    /// Backlog passed to `listen(2)` (default: `128`).
    pub backlog: i32,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            req: ReqLimits::default(),
            conn: ConnLimits::default(),
            backlog: 128,
        }
    }
}
