//! Error types for message analysis and reconstruction

use thiserror::Error;

/// Main error type for message engine operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    #[error("Header section is not valid UTF-8")]
    HeaderEncoding,

    #[error("Parameter span {start}..{end} does not match the current message ({len} bytes)")]
    StaleSpan {
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Result type alias for message engine operations
pub type MessageResult<T> = Result<T, MessageError>;
