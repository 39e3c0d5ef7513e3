//! Error types for hostview-core

use thiserror::Error;

/// Boxed error used at collaborator boundaries (body readers, hosts).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for request view operations
pub type Result<T, E = RequestError> = std::result::Result<T, E>;

/// Errors surfaced by [`ServerRequest`](crate::ServerRequest) accessors.
///
/// Parsing quirks in headers, cookies and query strings never show up here:
/// the parser degrades to literal text instead. Only operations that can
/// genuinely fail (composing a URL from host facts, reading the body,
/// deserializing into a caller-chosen type) return an error.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The host facts do not compose into a valid absolute URL
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Input could not be mapped onto the requested shape
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The body collaborator failed; the form cache stays unset
    #[error("failed to read request body: {0}")]
    BodyRead(#[from] BodyError),
}

impl RequestError {
    /// Create a malformed input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}

/// Errors produced by a [`BodyReader`](crate::BodyReader).
#[derive(Debug, Error)]
pub enum BodyError {
    /// The single-consumer body was already drained
    #[error("request body already consumed")]
    AlreadyConsumed,

    /// The body exceeded the configured limit
    #[error("request body exceeds the {limit} byte limit")]
    TooLarge {
        /// Limit that was exceeded, in bytes
        limit: usize,
    },

    /// The underlying stream failed
    #[error("{0}")]
    Read(BoxError),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that does not parse
    #[error("invalid value {value:?} for {var}")]
    InvalidVar {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },
}
