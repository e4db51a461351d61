//! Unified error type.

use thiserror::Error;

/// A boxed error produced by application code inside a handler or middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by the router's fallible operations.
///
/// A request that matches no route is *not* an error: it resolves to a
/// structured `404` problem document. `Error` surfaces the failures the
/// router cannot turn into a response on its own: a malformed proxy event,
/// a handler or middleware that gave up, a handler result that cannot be
/// serialised, or an I/O failure in the local development server.
#[derive(Debug, Error)]
pub enum Error {
    /// The inbound proxy event is missing a required field.
    #[error("invalid proxy event: {0}")]
    InvalidEvent(String),

    /// A route rule could not be compiled into a matcher.
    #[error("invalid route pattern `{rule}`: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// A handler or middleware failed. Propagated to the caller unmodified.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A handler returned something that cannot be turned into a response.
    #[error("cannot build response: {0}")]
    Response(String),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps any application error so it can be returned from a handler.
    ///
    /// ```rust
    /// use proxy_router::Error;
    ///
    /// let err = Error::handler("database unavailable");
    /// assert_eq!(err.to_string(), "handler failed: database unavailable");
    /// ```
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }
}
