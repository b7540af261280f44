//! Service layer orchestrating store mutations with permission checks and
//! change notifications.
//!
//! `RigService` wraps `RigDb` (raw database access), the checklist `Catalog`
//! and the `AccessPolicy` deciding what each role may do. All repo methods
//! are implemented as `impl RigService`.

use std::sync::Arc;

use rig_core::catalog::Catalog;
use rig_core::entities::ChangeEvent;
use rig_core::identity::{AccessPolicy, Actor, RolePolicy};
use rig_core::responses::Snapshot;
use tokio::sync::{Mutex, MutexGuard, broadcast};

use crate::RigDb;
use crate::changes::PendingChanges;
use crate::error::DatabaseError;
use crate::repos::checklist::RecordFilter;

/// Orchestrates store operations for one process.
///
/// Every mutation method follows this protocol:
/// 1. Check the actor's permission and validate input
/// 2. Take the store gate
/// 3. Begin transaction and execute SQL
/// 4. Commit (or roll back and surface the failure)
/// 5. Publish one change event per written row
///
/// The gate serializes access to the shared connection so that readers never
/// observe another caller's open transaction.
pub struct RigService {
    db: RigDb,
    catalog: Arc<Catalog>,
    policy: Arc<dyn AccessPolicy>,
    gate: Mutex<()>,
}

impl RigService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `change_buffer` - Capacity of the change notification channel.
    /// * `catalog` - Checklist catalog submissions are validated against.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(
        db_path: &str,
        change_buffer: usize,
        catalog: Catalog,
    ) -> Result<Self, DatabaseError> {
        let db = RigDb::open_local(db_path, change_buffer).await?;
        Ok(Self::from_db(db, catalog))
    }

    /// Create from an existing `RigDb` with the default role policy.
    #[must_use]
    pub fn from_db(db: RigDb, catalog: Catalog) -> Self {
        Self {
            db,
            catalog: Arc::new(catalog),
            policy: Arc::new(RolePolicy),
            gate: Mutex::new(()),
        }
    }

    /// Replace the permission policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &RigDb {
        &self.db
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn policy(&self) -> &dyn AccessPolicy {
        self.policy.as_ref()
    }

    /// Subscribe to row-level change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.db.changes().subscribe()
    }

    /// Read every visible record and all equipment under one store lock.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any query fails.
    pub async fn snapshot(&self, actor: &Actor) -> Result<Snapshot, DatabaseError> {
        let _guard = self.lock().await;
        let records = self.load_summaries(actor, &RecordFilter::default()).await?;
        let equipment = self.load_all_equipment().await?;
        Ok(Snapshot { records, equipment })
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    pub(crate) fn publish(&self, changes: PendingChanges) {
        self.db.changes().publish_all(changes.into_events());
    }

    /// Commit `tx` after `work` succeeded, otherwise roll it back and return
    /// the work's error.
    pub(crate) async fn finish_tx<T>(
        tx: libsql::Transaction,
        work: Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        match work {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}
