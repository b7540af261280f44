use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AnswerValue;

/// One operator answer for a checklist item.
///
/// Immutable once submitted. `photos` are opaque references supplied by the
/// capture collaborator, kept in submission order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Answer {
    pub item_id: String,
    pub value: AnswerValue,
    #[serde(default)]
    pub observation: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Answer {
    #[must_use]
    pub fn new(item_id: impl Into<String>, value: AnswerValue) -> Self {
        Self {
            item_id: item_id.into(),
            value,
            observation: None,
            photos: Vec::new(),
        }
    }

    #[must_use]
    pub fn pass(item_id: impl Into<String>) -> Self {
        Self::new(item_id, AnswerValue::Pass)
    }

    #[must_use]
    pub fn fail(item_id: impl Into<String>, observation: impl Into<String>) -> Self {
        Self {
            observation: Some(observation.into()),
            ..Self::new(item_id, AnswerValue::Fail)
        }
    }

    #[must_use]
    pub fn with_photo(mut self, reference: impl Into<String>) -> Self {
        self.photos.push(reference.into());
        self
    }
}
