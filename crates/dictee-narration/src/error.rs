//! Internal error types for narration HTTP calls.
//!
//! These errors are internal to `dictee-narration` and are mapped to
//! [`NarrationError`] at the boundary.

use std::time::Duration;

use dictee_core::NarrationError;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug, Error)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("narration server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// `error` (and `detail`) from the JSON body, or the raw body
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("narration request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, broken body...
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// 2xx response without audio.
    #[error("narration server returned an empty audio body")]
    EmptyBody,
}

impl HttpError {
    /// Classify a reqwest error, keeping timeouts apart.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(err)
        }
    }

    /// Whether another attempt may succeed.
    pub(crate) const fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Network(_) => true,
            Self::Timeout(_) | Self::EmptyBody => false,
        }
    }
}

impl From<HttpError> for NarrationError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout(after) => Self::Timeout(after),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// `{ "error": "...", "detail": "..." }` failure body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    detail: Option<String>,
}

/// Extract a human-readable message from a failure body.
pub(crate) fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            error,
            detail: Some(detail),
        }) => format!("{error} ({detail})"),
        Ok(ErrorBody { error, detail: None }) => error,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}
