//! Configuration types

use serde::{Deserialize, Serialize};

/// Static toggle configuration.
/// Set at construction time and shared by the components that encode,
/// decode, or strip the synthetic header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleConfig {
    /// Name of the synthetic header carrying the disabled-parameter list
    pub header_name: String,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Toggle-Parameters".to_string(),
        }
    }
}

impl ToggleConfig {
    /// The full line prefix the codec matches on: `"<name>: "`
    pub fn header_prefix(&self) -> String {
        format!("{}: ", self.header_name)
    }
}
