//! Initial disposition of a submission.
//!
//! This is the only place that encodes the escalation policy: equipment
//! failures go to a reviewer, accessory failures are rejected outright.

use crate::aggregate::AnswerTally;
use crate::enums::{CategoryClass, ChecklistStatus};

/// Reviewer name recorded on system-generated approval entries.
pub const SYSTEM_REVIEWER: &str = "Rigcheck (automatic)";

/// Comment recorded on system-generated approval entries.
pub const AUTO_APPROVAL_COMMENT: &str =
    "Approved automatically: all items conforming, no review required.";

/// Resolve the status a new submission is created with.
#[must_use]
pub const fn resolve(tally: &AnswerTally, class: CategoryClass) -> ChecklistStatus {
    if tally.non_conforming == 0 {
        return ChecklistStatus::Approved;
    }
    match class {
        CategoryClass::Accessory => ChecklistStatus::Rejected,
        CategoryClass::Equipment => ChecklistStatus::Pending,
    }
}

/// Whether a submission with this disposition receives a system approval entry.
///
/// Accessories reach `approved` only through the zero-failure branch and never
/// get a system note.
#[must_use]
pub const fn qualifies_for_auto_approval(status: ChecklistStatus, class: CategoryClass) -> bool {
    matches!(
        (status, class),
        (ChecklistStatus::Approved, CategoryClass::Equipment)
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn tally(non_conforming: u32, has_critical_issue: bool) -> AnswerTally {
        AnswerTally {
            total: 10,
            conforming: 10 - non_conforming,
            non_conforming,
            has_critical_issue,
        }
    }

    #[rstest]
    #[case(CategoryClass::Equipment)]
    #[case(CategoryClass::Accessory)]
    fn zero_failures_are_approved(#[case] class: CategoryClass) {
        assert_eq!(resolve(&tally(0, false), class), ChecklistStatus::Approved);
    }

    #[rstest]
    #[case(1, false)]
    #[case(1, true)]
    #[case(4, true)]
    fn accessory_failures_are_rejected(#[case] failures: u32, #[case] critical: bool) {
        assert_eq!(
            resolve(&tally(failures, critical), CategoryClass::Accessory),
            ChecklistStatus::Rejected
        );
    }

    #[rstest]
    #[case(1, false)]
    #[case(1, true)]
    #[case(3, false)]
    fn equipment_failures_go_to_review(#[case] failures: u32, #[case] critical: bool) {
        assert_eq!(
            resolve(&tally(failures, critical), CategoryClass::Equipment),
            ChecklistStatus::Pending
        );
    }

    #[test]
    fn all_not_applicable_is_approved() {
        let tally = AnswerTally {
            total: 5,
            ..AnswerTally::default()
        };
        assert_eq!(
            resolve(&tally, CategoryClass::Equipment),
            ChecklistStatus::Approved
        );
    }

    #[rstest]
    #[case(ChecklistStatus::Approved, CategoryClass::Equipment, true)]
    #[case(ChecklistStatus::Approved, CategoryClass::Accessory, false)]
    #[case(ChecklistStatus::Pending, CategoryClass::Equipment, false)]
    #[case(ChecklistStatus::Rejected, CategoryClass::Accessory, false)]
    fn auto_approval_rule(
        #[case] status: ChecklistStatus,
        #[case] class: CategoryClass,
        #[case] expected: bool,
    ) {
        assert_eq!(qualifies_for_auto_approval(status, class), expected);
    }
}
