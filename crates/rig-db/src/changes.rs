//! Row-level change notifications.
//!
//! Every committed row write is published as one `ChangeEvent` on a tokio
//! broadcast channel. Events are collected while a transaction is open and
//! published only after it commits, so subscribers never hear about rows
//! that were rolled back.

use rig_core::entities::ChangeEvent;
use rig_core::enums::{ChangeKind, ChangeTable};
use tokio::sync::broadcast;

/// Publisher side of the change notification channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Publish events in order. Having no subscribers is not an error.
    pub fn publish_all(&self, events: Vec<ChangeEvent>) {
        for event in events {
            tracing::trace!(table = %event.table, kind = %event.kind, row = %event.row_id, "change");
            let _ = self.tx.send(event);
        }
    }
}

/// Events gathered during one write, published on commit.
#[derive(Debug, Default)]
pub(crate) struct PendingChanges(Vec<ChangeEvent>);

impl PendingChanges {
    pub(crate) fn push(&mut self, table: ChangeTable, kind: ChangeKind, row_id: &str) {
        self.0.push(ChangeEvent::new(table, kind, row_id));
    }

    pub(crate) fn into_events(self) -> Vec<ChangeEvent> {
        self.0
    }
}
