//! Error types for toggle operations

use message_engine::MessageError;
use thiserror::Error;

/// Main error type for edit-session and filter operations
#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("Message processing failed: {0}")]
    Message(#[from] MessageError),

    #[error("No message has been loaded into the session")]
    NoMessage,

    #[error("Row index {index} is out of range for a {len}-row table")]
    RowOutOfRange { index: usize, len: usize },
}

/// Result type alias for toggle operations
pub type ToggleResult<T> = Result<T, ToggleError>;
