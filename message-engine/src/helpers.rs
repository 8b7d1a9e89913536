//! Capability interface over the analysis and reconstruction primitives
//!
//! Components that operate on messages take an explicit collaborator
//! handle instead of reaching for process-wide state, so embedders can
//! substitute their own implementation.

use crate::analyzer::analyze_request;
use crate::builder::{build_request, remove_parameter};
use crate::error::MessageResult;
use crate::types::{Parameter, RequestInfo};

/// Message analysis and reconstruction, as consumed by editing and
/// filtering components. Object-safe.
pub trait MessageHelpers: Send + Sync {
    /// Analyze a raw request into headers, body offset, and parameters
    fn analyze(&self, raw: &[u8]) -> MessageResult<RequestInfo>;

    /// Build a raw request from header lines and body bytes
    fn build(&self, headers: &[String], body: &[u8]) -> Vec<u8>;

    /// Return a new message with one parameter occurrence excised
    fn remove_parameter(&self, raw: &[u8], param: &Parameter) -> MessageResult<Vec<u8>>;
}

/// Default implementation backed by this crate's analyzer and builder
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpHelpers;

impl MessageHelpers for HttpHelpers {
    fn analyze(&self, raw: &[u8]) -> MessageResult<RequestInfo> {
        analyze_request(raw)
    }

    fn build(&self, headers: &[String], body: &[u8]) -> Vec<u8> {
        build_request(headers, body)
    }

    fn remove_parameter(&self, raw: &[u8], param: &Parameter) -> MessageResult<Vec<u8>> {
        remove_parameter(raw, param)
    }
}
