//! Message Engine
//!
//! HTTP request analysis and reconstruction primitives: splitting a raw
//! request into headers, body offset, and a typed parameter list, and
//! rebuilding or selectively excising parameters from the raw bytes.
//! The `MessageHelpers` trait is the seam consumed by editing and
//! filtering components.

pub mod analyzer;
pub mod builder;

/// Error types for message operations
pub mod error;

/// Capability trait and default implementation
pub mod helpers;

/// Request model types
pub mod types;

pub use analyzer::analyze_request;
pub use builder::{build_request, remove_parameter};
pub use error::{MessageError, MessageResult};
pub use helpers::{HttpHelpers, MessageHelpers};
pub use types::{ParamKind, Parameter, RequestInfo, Span};
