//! Equipment status projection.
//!
//! Pure mapping from the latest checklist disposition and the latest manual
//! status write to the equipment's availability. The store persists the
//! result after every decided checklist and every manual write.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ChecklistStatus, EquipmentStatus};

/// The most recent reviewed (non-pending) checklist of a piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LatestDisposition {
    pub status: ChecklistStatus,
    pub decided_at: DateTime<Utc>,
}

/// A status written directly by a reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ManualStatus {
    pub status: EquipmentStatus,
    pub written_at: DateTime<Utc>,
}

/// Operating-session state, owned by an external collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperatingSession {
    /// The approved pre-use inspection opens the operating session.
    #[default]
    Started,
    NotStarted,
}

/// Whether a manual write still takes precedence over the latest disposition.
#[must_use]
pub fn manual_prevails(manual: ManualStatus, latest: Option<LatestDisposition>) -> bool {
    latest.is_none_or(|d| d.decided_at <= manual.written_at)
}

/// Project the availability of one piece of equipment.
///
/// A manual write wins until a disposition decided after it arrives. Pending
/// records never reach this function; equipment stays as it was until review.
#[must_use]
pub fn project(
    manual: Option<ManualStatus>,
    latest: Option<LatestDisposition>,
    session: OperatingSession,
) -> EquipmentStatus {
    if let Some(manual) = manual
        && manual_prevails(manual, latest)
    {
        return manual.status;
    }

    match latest.map(|d| d.status) {
        Some(ChecklistStatus::Rejected) => EquipmentStatus::UnderMaintenance,
        Some(ChecklistStatus::Approved) => match session {
            OperatingSession::Started => EquipmentStatus::InOperation,
            OperatingSession::NotStarted => EquipmentStatus::Available,
        },
        Some(ChecklistStatus::Pending) | None => EquipmentStatus::Available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(minutes * 60, 0).unwrap()
    }

    fn decided(status: ChecklistStatus, minutes: i64) -> Option<LatestDisposition> {
        Some(LatestDisposition {
            status,
            decided_at: at(minutes),
        })
    }

    fn manual(status: EquipmentStatus, minutes: i64) -> Option<ManualStatus> {
        Some(ManualStatus {
            status,
            written_at: at(minutes),
        })
    }

    #[test]
    fn no_history_is_available() {
        assert_eq!(
            project(None, None, OperatingSession::Started),
            EquipmentStatus::Available
        );
    }

    #[test]
    fn rejection_puts_equipment_under_maintenance() {
        assert_eq!(
            project(None, decided(ChecklistStatus::Rejected, 5), OperatingSession::Started),
            EquipmentStatus::UnderMaintenance
        );
    }

    #[test]
    fn approval_depends_on_operating_session() {
        assert_eq!(
            project(None, decided(ChecklistStatus::Approved, 5), OperatingSession::Started),
            EquipmentStatus::InOperation
        );
        assert_eq!(
            project(None, decided(ChecklistStatus::Approved, 5), OperatingSession::NotStarted),
            EquipmentStatus::Available
        );
    }

    #[test]
    fn manual_write_wins_over_older_disposition() {
        assert_eq!(
            project(
                manual(EquipmentStatus::Available, 10),
                decided(ChecklistStatus::Rejected, 5),
                OperatingSession::Started,
            ),
            EquipmentStatus::Available
        );
    }

    #[test]
    fn newer_disposition_supersedes_manual_write() {
        assert_eq!(
            project(
                manual(EquipmentStatus::Available, 10),
                decided(ChecklistStatus::Rejected, 15),
                OperatingSession::Started,
            ),
            EquipmentStatus::UnderMaintenance
        );
    }

    #[test]
    fn manual_write_without_records() {
        assert_eq!(
            project(
                manual(EquipmentStatus::UnderMaintenance, 1),
                None,
                OperatingSession::Started
            ),
            EquipmentStatus::UnderMaintenance
        );
    }
}
