//! Capability surface presented to the embedding host
//!
//! Plain structural traits instead of a host-defined inheritance
//! hierarchy: an editor tab the host can embed, and a message listener
//! the host invokes on intercepted traffic. `ToggleExtension` wires
//! both up from one configuration and one collaborator handle.

use std::sync::Arc;

use message_engine::MessageHelpers;
use tracing::warn;

use crate::config::ToggleConfig;
use crate::error::ToggleResult;
use crate::filter::SendFilter;
use crate::session::EditSession;

/// Editor-tab contract consumed by the host shell.
///
/// The embeddable view seam is the session's row table plus its
/// column-writability query; rendering is entirely the host's concern.
pub trait MessageEditorTab {
    /// Display caption for the tab
    fn caption(&self) -> &str;

    /// Load a message into the tab. Void by host contract: failures are
    /// logged, never surfaced.
    fn set_message(&mut self, raw: &[u8], is_request: bool);

    /// The message in its current edited form
    fn message(&self) -> ToggleResult<Vec<u8>>;

    /// Whether any cell has been written since the tab was created
    fn is_modified(&self) -> bool;

    /// Whether this tab applies to the given message at all
    fn is_enabled_for(&self, raw: &[u8], is_request: bool) -> bool;
}

impl MessageEditorTab for EditSession {
    fn caption(&self) -> &str {
        EditSession::caption(self)
    }

    fn set_message(&mut self, raw: &[u8], is_request: bool) {
        if let Err(error) = self.load(raw, is_request) {
            warn!(session = %self.id(), %error, "failed to load message into editor tab");
        }
    }

    fn message(&self) -> ToggleResult<Vec<u8>> {
        self.serialize()
    }

    fn is_modified(&self) -> bool {
        EditSession::is_modified(self)
    }

    fn is_enabled_for(&self, raw: &[u8], is_request: bool) -> bool {
        self.is_eligible(raw, is_request)
    }
}

/// Network-intercept contract consumed by the host shell
pub trait MessageListener {
    /// Inspect and possibly replace a message about to be transmitted.
    /// `tool_flag` identifies the originating host tool and is passed
    /// through for the host's own bookkeeping.
    fn process_message(&self, tool_flag: u32, is_request: bool, message: &mut Vec<u8>);
}

impl MessageListener for SendFilter {
    fn process_message(&self, tool_flag: u32, is_request: bool, message: &mut Vec<u8>) {
        if !is_request {
            return;
        }
        match self.filter_request(message) {
            Ok(filtered) => *message = filtered,
            Err(error) => {
                // best effort: transmit the request unchanged
                warn!(tool_flag, %error, "send-time filter failed, passing request through");
            }
        }
    }
}

/// Registration shell: constructs editor tabs and listeners from one
/// configuration and one collaborator handle, replacing the
/// process-wide singletons of older designs.
pub struct ToggleExtension {
    config: ToggleConfig,
    helpers: Arc<dyn MessageHelpers>,
}

impl ToggleExtension {
    /// Create the extension with explicit collaborators
    pub fn new(config: ToggleConfig, helpers: Arc<dyn MessageHelpers>) -> Self {
        Self { config, helpers }
    }

    /// Extension name reported to the host
    pub fn name(&self) -> &'static str {
        "Toggle Parameters"
    }

    /// Create one editor tab instance; the host calls this once per tab
    pub fn create_editor_tab(&self, editable: bool) -> EditSession {
        EditSession::new(&self.config, Arc::clone(&self.helpers), editable)
    }

    /// Create the send-time listener
    pub fn listener(&self) -> SendFilter {
        SendFilter::new(&self.config, Arc::clone(&self.helpers))
    }
}

impl std::fmt::Debug for ToggleExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleExtension")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message_engine::HttpHelpers;

    fn extension() -> ToggleExtension {
        ToggleExtension::new(ToggleConfig::default(), Arc::new(HttpHelpers))
    }

    #[test]
    fn test_editor_tab_surface() {
        let ext = extension();
        let mut tab: Box<dyn MessageEditorTab> = Box::new(ext.create_editor_tab(true));
        assert_eq!(tab.caption(), "Toggle Parameters");

        let raw = b"GET /x?p=1 HTTP/1.1\r\n\r\n";
        assert!(tab.is_enabled_for(raw, true));
        tab.set_message(raw, true);
        assert!(!tab.is_modified());
        assert_eq!(tab.message().unwrap(), raw.to_vec());
    }

    #[test]
    fn test_listener_rewrites_requests_only() {
        let ext = extension();
        let listener: Box<dyn MessageListener> = Box::new(ext.listener());

        let mut request =
            b"GET /x?a=1&b=2 HTTP/1.1\r\nX-Toggle-Parameters: a\r\n\r\n".to_vec();
        listener.process_message(64, true, &mut request);
        assert_eq!(request, b"GET /x?b=2 HTTP/1.1\r\n\r\n".to_vec());

        let mut response = b"HTTP/1.1 200 OK\r\n\r\n".to_vec();
        let before = response.clone();
        listener.process_message(64, false, &mut response);
        assert_eq!(response, before);
    }

    #[test]
    fn test_listener_passes_malformed_requests_through() {
        let ext = extension();
        let listener = ext.listener();

        let mut garbage = b"not-http".to_vec();
        let before = garbage.clone();
        listener.process_message(4, true, &mut garbage);
        assert_eq!(garbage, before);
    }

    #[test]
    fn test_custom_header_name_flows_through() {
        let config = ToggleConfig {
            header_name: "X-Off".to_string(),
        };
        let ext = ToggleExtension::new(config, Arc::new(HttpHelpers));
        let listener = ext.listener();

        let mut request = b"GET /x?a=1 HTTP/1.1\r\nX-Off: a\r\n\r\n".to_vec();
        listener.process_message(0, true, &mut request);
        assert_eq!(request, b"GET /x HTTP/1.1\r\n\r\n".to_vec());
    }
}
