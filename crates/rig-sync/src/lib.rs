//! # rig-sync
//!
//! Keeps one client session's view of the Rigcheck store consistent.
//!
//! Change notifications are debounced into a single full reconciliation
//! fetch. Focus, reconnect and lagging notification streams force an
//! immediate fetch. Fetches retry transient failures with capped exponential
//! backoff, and a newer fetch cancels an in-flight one instead of queueing
//! behind it. The latest state is published on a `watch` channel.

pub mod backoff;
pub mod cache;
pub mod error;
pub mod source;
pub mod synchronizer;

pub use backoff::BackoffPolicy;
pub use error::SyncError;
pub use source::{SnapshotSource, StoreSource};
pub use synchronizer::{Connectivity, SyncHandle, SyncSettings, SyncState, Synchronizer, Trigger};
