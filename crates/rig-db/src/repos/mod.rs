//! Repository modules implementing store operations for all Rigcheck entities.
//!
//! Each module adds methods to `RigService` via `impl RigService` blocks.

pub mod checklist;
pub mod equipment;
pub mod review;
