//! Edit session: the live parameter table for one message being edited

use std::sync::Arc;

use message_engine::MessageHelpers;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::codec::ToggleCodec;
use crate::config::ToggleConfig;
use crate::error::{ToggleError, ToggleResult};

pub use message_engine::ParamKind;

/// One editable row of the parameter table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamRow {
    /// Whether the parameter is transmitted (false = disabled)
    pub enabled: bool,
    /// Parameter kind, display only
    pub kind: ParamKind,
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: String,
}

/// Table columns, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    Enabled,
    Kind,
    Name,
    Value,
}

/// Editable view of one request's parameters.
///
/// Holds the raw message it was loaded from, a row per reported
/// parameter, and a dirty flag covering the whole lifetime of the
/// session object. State is owned by one editor tab instance; sessions
/// are never shared.
pub struct EditSession {
    id: Uuid,
    codec: ToggleCodec,
    helpers: Arc<dyn MessageHelpers>,
    editable: bool,
    message: Option<Vec<u8>>,
    rows: Vec<ParamRow>,
    modified: bool,
}

impl EditSession {
    /// Create a session with explicit collaborators
    pub fn new(config: &ToggleConfig, helpers: Arc<dyn MessageHelpers>, editable: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            codec: ToggleCodec::new(config),
            helpers,
            editable,
            message: None,
            rows: Vec::new(),
            modified: false,
        }
    }

    /// Session identity, used only for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether non-toggle columns accept writes
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Tab caption shown by the host
    pub fn caption(&self) -> &'static str {
        "Toggle Parameters"
    }

    /// Load a request into the session, rebuilding the row table.
    ///
    /// Responses are ignored and leave the session untouched. The dirty
    /// flag is NOT cleared here: it tracks writes over the lifetime of
    /// the session object, not of a single load.
    pub fn load(&mut self, raw: &[u8], is_request: bool) -> ToggleResult<()> {
        if !is_request {
            debug!(session = %self.id, "ignoring response load");
            return Ok(());
        }
        self.message = Some(raw.to_vec());
        self.rows.clear();

        let info = self.helpers.analyze(raw)?;
        let disabled = self.codec.decode(&info.headers);
        for param in &info.parameters {
            self.rows.push(ParamRow {
                enabled: !disabled.contains(&param.name),
                kind: param.kind,
                name: param.name.clone(),
                value: param.value.clone(),
            });
        }
        debug!(
            session = %self.id,
            rows = self.rows.len(),
            disabled = disabled.len(),
            "loaded request"
        );
        Ok(())
    }

    /// The current row table
    pub fn rows(&self) -> &[ParamRow] {
        &self.rows
    }

    /// Whether any cell write has occurred since session construction
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether the rendering layer should offer a column for editing
    pub fn is_cell_writable(&self, column: Column) -> bool {
        match column {
            Column::Enabled => true,
            Column::Kind => false,
            Column::Name | Column::Value => self.editable,
        }
    }

    /// Toggle a row's transmission flag
    pub fn set_enabled(&mut self, row: usize, enabled: bool) -> ToggleResult<()> {
        self.write_row(row, |r| r.enabled = enabled)
    }

    /// Rename a row's parameter (editable sessions; the rendering layer
    /// gates this via `is_cell_writable`)
    pub fn set_name(&mut self, row: usize, name: &str) -> ToggleResult<()> {
        self.write_row(row, |r| r.name = name.to_string())
    }

    /// Rewrite a row's value (editable sessions, gated as for
    /// `set_name`)
    pub fn set_value(&mut self, row: usize, value: &str) -> ToggleResult<()> {
        self.write_row(row, |r| r.value = value.to_string())
    }

    /// The single cell-write path: marks the session dirty
    /// unconditionally, then applies the write.
    fn write_row(&mut self, row: usize, write: impl FnOnce(&mut ParamRow)) -> ToggleResult<()> {
        let len = self.rows.len();
        let target = self
            .rows
            .get_mut(row)
            .ok_or(ToggleError::RowOutOfRange { index: row, len })?;
        self.modified = true;
        write(target);
        Ok(())
    }

    /// Whether the editor should be surfaced for this message at all:
    /// requests only, editable sessions only, and only when the
    /// analyzer reports at least one parameter.
    pub fn is_eligible(&self, raw: &[u8], is_request: bool) -> bool {
        if !is_request || !self.editable {
            return false;
        }
        match self.helpers.analyze(raw) {
            Ok(info) => !info.parameters.is_empty(),
            Err(_) => false,
        }
    }

    /// Names of currently disabled rows, in row order
    pub fn disabled_names(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| !r.enabled)
            .map(|r| r.name.clone())
            .collect()
    }

    /// Re-encode the current disabled set into the loaded message.
    ///
    /// Parameter values and body bytes are never altered here; only the
    /// synthetic header is added, replaced, or removed, in the codec's
    /// canonical form.
    pub fn serialize(&self) -> ToggleResult<Vec<u8>> {
        let raw = self.message.as_ref().ok_or(ToggleError::NoMessage)?;
        let disabled = self.disabled_names();
        let info = self.helpers.analyze(raw)?;
        let headers = self.codec.encode(&info.headers, &disabled);
        debug!(
            session = %self.id,
            disabled = disabled.len(),
            "serializing message"
        );
        Ok(self.helpers.build(&headers, &raw[info.body_offset..]))
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("id", &self.id)
            .field("editable", &self.editable)
            .field("rows", &self.rows.len())
            .field("modified", &self.modified)
            .finish()
    }
}
