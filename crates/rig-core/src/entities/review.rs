use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Append-only approval entry on a checklist.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Approval {
    pub id: String,
    pub checklist_id: String,
    pub reviewer: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only rejection entry on a checklist. `reason` is never empty.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Rejection {
    pub id: String,
    pub checklist_id: String,
    pub reviewer: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
