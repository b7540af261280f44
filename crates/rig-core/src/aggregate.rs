//! Answer aggregation.
//!
//! Reduces a submission's answers into counters and the critical-issue flag.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Answer;
use crate::enums::{AnswerValue, CategoryClass};

/// Counters derived from a set of answers.
///
/// `not_applicable` answers count toward `total` only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerTally {
    pub total: u32,
    pub conforming: u32,
    pub non_conforming: u32,
    pub has_critical_issue: bool,
}

impl AnswerTally {
    /// Aggregate `answers` for a category of the given class.
    ///
    /// For equipment categories a failure is critical only when its item id is
    /// in `critical`. For accessory categories any failure is critical.
    #[must_use]
    pub fn from_answers(
        answers: &[Answer],
        class: CategoryClass,
        critical: &BTreeSet<String>,
    ) -> Self {
        let mut tally = Self::default();
        for answer in answers {
            tally.total += 1;
            match answer.value {
                AnswerValue::Pass => tally.conforming += 1,
                AnswerValue::Fail => {
                    tally.non_conforming += 1;
                    let critical_failure = match class {
                        CategoryClass::Accessory => true,
                        CategoryClass::Equipment => critical.contains(&answer.item_id),
                    };
                    tally.has_critical_issue |= critical_failure;
                }
                AnswerValue::NotApplicable => {}
            }
        }
        tally
    }
}
