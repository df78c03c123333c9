//! HTTP access layer error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Studyhall API.
///
/// Variants carry owned strings and status codes rather than the transport
/// library's opaque error type, so callers (and tests) can construct and
/// match them directly.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request timed out before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// No response was received (DNS failure, connection refused, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status of the response.
        status: StatusCode,
        /// Structured `detail` message from the error body, when present.
        detail: Option<String>,
    },

    /// A response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(String),
}

impl ApiError {
    /// Classify a transport-level failure from the HTTP client.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }

    /// The HTTP status of the failure, if the server responded at all.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The structured server `detail` message, if present.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}
