//! Send-time filter: enforce the disabled set on outgoing requests
//!
//! The edit session only declares intent via the synthetic header; this
//! component is the enforcement point. It holds no state between
//! invocations and is safe to call from concurrent interception paths.

use std::sync::Arc;

use message_engine::MessageHelpers;
use tracing::{debug, info};

use crate::codec::ToggleCodec;
use crate::config::ToggleConfig;
use crate::error::ToggleResult;

/// Removes disabled parameters and the synthetic header from requests
/// about to be transmitted
#[derive(Clone)]
pub struct SendFilter {
    codec: ToggleCodec,
    helpers: Arc<dyn MessageHelpers>,
}

impl SendFilter {
    /// Create a filter with explicit collaborators
    pub fn new(config: &ToggleConfig, helpers: Arc<dyn MessageHelpers>) -> Self {
        Self {
            codec: ToggleCodec::new(config),
            helpers,
        }
    }

    /// Produce the message to actually transmit.
    ///
    /// A request without the synthetic header is returned
    /// byte-identical. Otherwise each listed name removes the first
    /// matching parameter, re-analyzing between removals because every
    /// excision shifts the offsets of what remains. Names with no match
    /// are skipped silently. The synthetic header itself never leaves
    /// the process.
    pub fn filter_request(&self, raw: &[u8]) -> ToggleResult<Vec<u8>> {
        let info = self.helpers.analyze(raw)?;
        let disabled = self.codec.decode(&info.headers);
        if disabled.is_empty() {
            return Ok(raw.to_vec());
        }

        let mut current = raw.to_vec();
        let mut removed = 0usize;
        for name in &disabled {
            // spans are only valid against the bytes they were reported
            // on, so every removal forces a fresh analysis
            let info = self.helpers.analyze(&current)?;
            match info.parameters.iter().find(|p| p.name == *name) {
                Some(param) => {
                    current = self.helpers.remove_parameter(&current, param)?;
                    removed += 1;
                }
                None => {
                    debug!(name = %name, "disabled parameter not present, skipping");
                }
            }
        }

        let info = self.helpers.analyze(&current)?;
        let headers = self.codec.strip(&info.headers);
        let body = current[info.body_offset..].to_vec();
        info!(
            disabled = disabled.len(),
            removed, "rewrote outgoing request"
        );
        Ok(self.helpers.build(&headers, &body))
    }
}

impl std::fmt::Debug for SendFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendFilter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message_engine::HttpHelpers;

    fn filter() -> SendFilter {
        SendFilter::new(&ToggleConfig::default(), Arc::new(HttpHelpers))
    }

    #[test]
    fn test_fast_path_is_byte_identical() {
        let raw = b"GET /x?p=1&q=2 HTTP/1.1\r\nHost: a\r\n\r\n";
        assert_eq!(filter().filter_request(raw).unwrap(), raw.to_vec());
    }

    #[test]
    fn test_removes_listed_parameters_and_header() {
        let raw =
            b"GET /x?a=1&b=2&c=3 HTTP/1.1\r\nHost: a\r\nX-Toggle-Parameters: a,c\r\n\r\n";
        let out = filter().filter_request(raw).unwrap();
        assert_eq!(out, b"GET /x?b=2 HTTP/1.1\r\nHost: a\r\n\r\n".to_vec());
    }

    #[test]
    fn test_unknown_names_skipped() {
        let raw = b"GET /x?a=1 HTTP/1.1\r\nX-Toggle-Parameters: ghost\r\n\r\n";
        let out = filter().filter_request(raw).unwrap();
        assert_eq!(out, b"GET /x?a=1 HTTP/1.1\r\n\r\n".to_vec());
    }

    #[test]
    fn test_empty_value_header_is_stripped() {
        // one empty-string disabled name: removes nothing, but the
        // header must still be cleaned up before transmission
        let raw = b"GET /x?a=1 HTTP/1.1\r\nX-Toggle-Parameters: \r\n\r\n";
        let out = filter().filter_request(raw).unwrap();
        assert_eq!(out, b"GET /x?a=1 HTTP/1.1\r\n\r\n".to_vec());
    }

    #[test]
    fn test_duplicate_name_removes_one_instance_per_listing() {
        let raw = b"GET /x?a=1&a=2&b=3 HTTP/1.1\r\nX-Toggle-Parameters: a\r\n\r\n";
        let out = filter().filter_request(raw).unwrap();
        assert_eq!(out, b"GET /x?a=2&b=3 HTTP/1.1\r\n\r\n".to_vec());
    }

    #[test]
    fn test_name_listed_twice_removes_both_instances() {
        let raw = b"GET /x?a=1&a=2 HTTP/1.1\r\nX-Toggle-Parameters: a,a\r\n\r\n";
        let out = filter().filter_request(raw).unwrap();
        assert_eq!(out, b"GET /x HTTP/1.1\r\n\r\n".to_vec());
    }

    #[test]
    fn test_removes_across_kinds() {
        let raw = b"POST /l HTTP/1.1\r\nCookie: sid=abc\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 17\r\nX-Toggle-Parameters: sid,pass\r\n\r\nuser=bob&pass=123";
        let out = filter().filter_request(raw).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(!text.contains("Cookie"));
        assert!(!text.contains("pass"));
        assert!(!text.contains("X-Toggle-Parameters"));
        assert!(text.ends_with("user=bob"));
        assert!(text.contains("Content-Length: 8\r\n"));
    }
}
