use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ChangeKind, ChangeTable};

/// Row-level change notification published after a committed write.
///
/// No ordering is guaranteed across tables.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub kind: ChangeKind,
    pub row_id: String,
}

impl ChangeEvent {
    #[must_use]
    pub fn new(table: ChangeTable, kind: ChangeKind, row_id: impl Into<String>) -> Self {
        Self {
            table,
            kind,
            row_id: row_id.into(),
        }
    }
}
