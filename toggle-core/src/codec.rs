//! Disabled-set codec: one synthetic header line in, one out
//!
//! The comma-joined name list in a single header is the only persisted
//! signal of toggle state, so this codec is deliberately literal: no
//! trimming, no dedup, no escaping. Names containing commas are not
//! supported.

use crate::config::ToggleConfig;

/// Bidirectional mapping between a disabled-name list and a header list
#[derive(Debug, Clone)]
pub struct ToggleCodec {
    prefix: String,
}

impl ToggleCodec {
    /// Create a codec matching the configured header prefix
    pub fn new(config: &ToggleConfig) -> Self {
        Self {
            prefix: config.header_prefix(),
        }
    }

    /// Decode the disabled-name list from the first header carrying the
    /// prefix. Absence decodes to an empty list. A present header with
    /// an empty value decodes to one empty name.
    pub fn decode(&self, headers: &[String]) -> Vec<String> {
        for header in headers {
            if let Some(rest) = header.strip_prefix(&self.prefix) {
                return rest.split(',').map(str::to_string).collect();
            }
        }
        Vec::new()
    }

    /// Remove every prefixed header line, preserving the rest in order
    pub fn strip(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .filter(|h| !h.starts_with(&self.prefix))
            .cloned()
            .collect()
    }

    /// Replace any existing prefixed header with one canonical line at
    /// the end, in caller-supplied name order. An empty list encodes to
    /// no header at all.
    pub fn encode(&self, headers: &[String], disabled: &[String]) -> Vec<String> {
        let mut out = self.strip(headers);
        if !disabled.is_empty() {
            out.push(format!("{}{}", self.prefix, disabled.join(",")));
        }
        out
    }
}
