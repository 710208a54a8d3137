//! Error types returned by the revocation client.

use reqwest::StatusCode;
use serde::Deserialize;

/// Result alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while talking to the revocation service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network-level failure (connect, DNS, TLS, timeout) that outlived every retry.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-retryable client error reported by the service with a JSON body.
    #[error("jwt-revoke error: {message} (status: {})", .status.as_u16())]
    Api {
        status: StatusCode,
        message: String,
        data: serde_json::Value,
    },

    /// The last attempt still returned a retryable status (5xx or 429).
    #[error("giving up after {attempts} attempt(s), last status: {status}")]
    RetriesExhausted { status: StatusCode, attempts: usize },

    /// The service answered with a status the operation does not accept.
    #[error("unexpected status code: {status}")]
    UnexpectedStatus { status: StatusCode },

    /// A success response carried a body that is not the expected JSON.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// HTTP status associated with this error, if the service answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. }
            | Error::RetriesExhausted { status, .. }
            | Error::UnexpectedStatus { status } => Some(*status),
            Error::Transport(e) => e.status(),
            Error::Decode(_) | Error::Cancelled | Error::InvalidConfig(_) => None,
        }
    }

    /// Whether this is a structured error body returned by the service.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Api { .. })
    }
}

/// Error body sent by the service alongside 4xx responses.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ErrorBody {
    /// Parses an error body, falling back to an empty message for anything unreadable.
    pub(crate) fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    pub(crate) fn into_error(self, status: StatusCode) -> Error {
        Error::Api {
            status,
            message: self.message,
            data: self.data,
        }
    }
}
