//! View types produced for list, detail and equipment screens, and returned
//! as JSON by `rig` commands.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::AnswerTally;
use crate::entities::{Answer, Approval, ChecklistRecord, Equipment, OperatorRef, Rejection};
use crate::enums::{CategoryClass, ChecklistStatus};

/// One row of a checklist list view.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: String,
    pub equipment_id: Option<String>,
    pub equipment_code: Option<String>,
    pub equipment_model: Option<String>,
    pub operator: OperatorRef,
    pub category: String,
    pub category_class: CategoryClass,
    pub created_at: DateTime<Utc>,
    pub status: ChecklistStatus,
    pub status_changed_at: DateTime<Utc>,
    pub tally: AnswerTally,
    pub latest_approval: Option<Approval>,
    pub latest_rejection: Option<Rejection>,
}

/// Full record with its answers and review history.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChecklistDetail {
    pub record: ChecklistRecord,
    pub equipment: Option<Equipment>,
    pub answers: Vec<Answer>,
    pub approvals: Vec<Approval>,
    pub rejections: Vec<Rejection>,
}

/// Result of `rig submit`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub record: ChecklistRecord,
    /// System approval entry, when the auto-approval rule applied and its
    /// write succeeded.
    pub auto_approval: Option<Approval>,
}

/// Full view of the store as one actor sees it, re-read on every
/// reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Snapshot {
    /// Visible records, newest first.
    pub records: Vec<RecordSummary>,
    /// All registered equipment ordered by code.
    pub equipment: Vec<Equipment>,
}
