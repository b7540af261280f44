//! Entity structs for all Rigcheck domain objects.
//!
//! Each persisted entity maps to a table in the libSQL store. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip and schema
//! validation.

mod answer;
mod change;
mod checklist;
mod equipment;
mod review;

pub use answer::Answer;
pub use change::ChangeEvent;
pub use checklist::{ChecklistRecord, NewChecklist, OperatorRef};
pub use equipment::{Equipment, NewEquipment};
pub use review::{Approval, Rejection};
