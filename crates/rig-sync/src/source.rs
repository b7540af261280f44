//! Where reconciliation fetches read from.

use std::future::Future;
use std::sync::Arc;

use rig_core::identity::Actor;
use rig_core::responses::Snapshot;
use rig_db::service::RigService;

use crate::error::SyncError;

/// A full-state read used by every reconciliation.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Snapshot, SyncError>> + Send;
}

/// Reads the store as one actor sees it.
pub struct StoreSource {
    service: Arc<RigService>,
    actor: Actor,
}

impl StoreSource {
    #[must_use]
    pub const fn new(service: Arc<RigService>, actor: Actor) -> Self {
        Self { service, actor }
    }
}

impl SnapshotSource for StoreSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot, SyncError> {
        Ok(self.service.snapshot(&self.actor).await?)
    }
}
