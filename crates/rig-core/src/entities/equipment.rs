use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EquipmentStatus, StatusSource};

/// A registered piece of mobile equipment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Equipment {
    pub id: String,
    pub code: String,
    pub model: String,
    /// Checklist category used to inspect this equipment.
    pub category: String,
    pub location: Option<String>,
    pub status: EquipmentStatus,
    pub status_source: StatusSource,
    /// Observation attached to a manual status write.
    pub status_note: Option<String>,
    pub status_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Registration input for a new piece of equipment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewEquipment {
    pub code: String,
    pub model: String,
    pub category: String,
    #[serde(default)]
    pub location: Option<String>,
}
