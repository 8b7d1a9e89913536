//! Toggle Core
//!
//! Selective disabling of HTTP request parameters without deleting
//! them. Toggle state rides inside the message as one synthetic header
//! line, so the editing surface and the network interceptor need no
//! other shared storage: the edit session declares intent by encoding
//! the header, and the send-time filter enforces it by removing the
//! listed parameters before transmission.

pub mod codec;
pub mod filter;
pub mod session;
pub mod surface;

/// Configuration types
pub mod config;

/// Error types for toggle operations
pub mod error;

pub use codec::ToggleCodec;
pub use config::ToggleConfig;
pub use error::{ToggleError, ToggleResult};
pub use filter::SendFilter;
pub use session::{Column, EditSession, ParamKind, ParamRow};
pub use surface::{MessageEditorTab, MessageListener, ToggleExtension};
