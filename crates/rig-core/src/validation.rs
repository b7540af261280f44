//! Submission validation.
//!
//! Runs before aggregation. A submission that fails here is never persisted.

use std::collections::BTreeSet;

use crate::catalog::{Catalog, CategoryDef};
use crate::entities::NewChecklist;
use crate::enums::AnswerValue;
use crate::errors::CoreError;

/// Check a submission against the catalog and return its category.
///
/// Collects every problem into a single `CoreError::Validation` message.
///
/// # Errors
///
/// Returns `CoreError::Validation` for an unknown category, blank operator
/// identity, missing signature, answers naming unknown items, duplicate
/// answers, failed items without an observation, unanswered required items,
/// or an equipment reference that does not match the category class.
pub fn validate_submission<'c>(
    catalog: &'c Catalog,
    submission: &NewChecklist,
) -> Result<&'c CategoryDef, CoreError> {
    let Some(category) = catalog.category(&submission.category) else {
        return Err(CoreError::Validation(format!(
            "unknown checklist category '{}'",
            submission.category
        )));
    };

    let mut problems = Vec::new();

    if submission.operator.name.trim().is_empty() {
        problems.push("operator name is required".to_string());
    }
    if submission.operator.badge_id.trim().is_empty() {
        problems.push("operator badge id is required".to_string());
    }
    if submission
        .signature
        .as_deref()
        .is_none_or(|s| s.trim().is_empty())
    {
        problems.push("signature is required".to_string());
    }

    match (category.class.is_equipment_bound(), &submission.equipment_id) {
        (true, None) => problems.push(format!(
            "category '{}' requires an equipment reference",
            category.id
        )),
        (false, Some(_)) => problems.push(format!(
            "accessory category '{}' does not take an equipment reference",
            category.id
        )),
        _ => {}
    }

    let mut answered = BTreeSet::new();
    for answer in &submission.answers {
        if category.item(&answer.item_id).is_none() {
            problems.push(format!(
                "item '{}' does not belong to category '{}'",
                answer.item_id, category.id
            ));
        } else if !answered.insert(answer.item_id.as_str()) {
            problems.push(format!("item '{}' answered more than once", answer.item_id));
        }
        if answer.value == AnswerValue::Fail
            && answer
                .observation
                .as_deref()
                .is_none_or(|o| o.trim().is_empty())
        {
            problems.push(format!(
                "item '{}' failed without an observation",
                answer.item_id
            ));
        }
    }

    let missing: Vec<&str> = category
        .required_items()
        .filter(|item| !answered.contains(item.id.as_str()))
        .map(|item| item.id.as_str())
        .collect();
    if !missing.is_empty() {
        problems.push(format!("missing required answers: {}", missing.join(", ")));
    }

    if problems.is_empty() {
        Ok(category)
    } else {
        Err(CoreError::Validation(problems.join("; ")))
    }
}
