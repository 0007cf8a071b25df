use std::time::Duration;

use thiserror::Error;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum RectError {
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("connection failed for `{peer}`: {reason}")]
    Connection { peer: String, reason: String },

    #[error("transport send failed: {reason}")]
    TransportSend { reason: String },

    #[error("transport receive failed: {reason}")]
    TransportReceive { reason: String },

    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("response is missing the header/body boundary")]
    MissingHeaderBoundary,

    #[error("response decode failed: {0}")]
    ResponseDecode(String),

    #[error("response body is not valid UTF-8: {0}")]
    BodyNotUtf8(String),
}

impl RectError {
    pub(crate) fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}
