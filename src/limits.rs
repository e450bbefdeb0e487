//! Configurable bounds on what the API will accept from a client.

use std::time::Duration;

/// Per-request resource bounds and listener tuning.
///
/// Start from [`ApiLimits::default`] and adjust individual fields:
///
/// ```
/// use webrcon::ApiLimits;
///
/// let mut limits = ApiLimits::default();
/// limits.body_size = 4 * 1024;
/// ```
#[derive(Debug, Clone)]
pub struct ApiLimits {
    /// Maximum size of a request head in bytes. A head that fills this
    /// bound is answered with `431` and the connection closed.
    ///
    /// Default: `2 * 1024`
    pub head_size: usize,

    /// Maximum size of a request body in bytes. A body at or over this
    /// bound is answered with `413`.
    ///
    /// Default: `1024`
    pub body_size: usize,

    /// Listen backlog handed to the operating system.
    ///
    /// Default: `500`
    pub backlog: i32,

    /// Bound on any single read from a client socket. A client that
    /// stalls its head or body past this is answered with a client
    /// error instead of holding a thread hostage.
    ///
    /// Default: `5s`
    pub read_timeout: Duration,

    // keeps the struct open to new fields without a breaking change
    _priv: (),
}

impl Default for ApiLimits {
    fn default() -> Self {
        Self {
            head_size: 2 * 1024,
            body_size: 1024,
            backlog: 500,
            read_timeout: Duration::from_secs(5),
            _priv: (),
        }
    }
}
