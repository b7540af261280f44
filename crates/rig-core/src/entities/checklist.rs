use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::answer::Answer;
use crate::aggregate::AnswerTally;
use crate::enums::{CategoryClass, ChecklistStatus};

/// Operator identity recorded on a submission.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OperatorRef {
    pub name: String,
    pub badge_id: String,
}

/// A checklist as handed in by the operator, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewChecklist {
    pub category: String,
    /// Registered equipment id. `None` for accessory checklists.
    #[serde(default)]
    pub equipment_id: Option<String>,
    pub operator: OperatorRef,
    /// Reference to the captured signature artifact.
    #[serde(default)]
    pub signature: Option<String>,
    pub answers: Vec<Answer>,
}

/// A persisted checklist header with its derived counters and status.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChecklistRecord {
    pub id: String,
    pub equipment_id: Option<String>,
    pub operator: OperatorRef,
    pub category: String,
    pub category_class: CategoryClass,
    pub signature: String,
    pub tally: AnswerTally,
    pub status: ChecklistStatus,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
}
