//! # rig-db
//!
//! libSQL record store for Rigcheck.
//!
//! Persists checklist records with their answers and photos, the append-only
//! approval and rejection logs, and the equipment registry. Mutations run in
//! transactions and publish one row-level change notification per committed
//! row on the [`changes::ChangeFeed`].

pub mod changes;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod retry;
pub mod service;

#[cfg(test)]
mod test_support;

use changes::ChangeFeed;
use error::DatabaseError;
use libsql::Builder;

/// Default capacity of the change notification channel.
pub const DEFAULT_CHANGE_BUFFER: usize = 256;

/// Central database handle for all Rigcheck state.
///
/// Wraps a libSQL database, its connection and the change feed.
pub struct RigDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    changes: ChangeFeed,
}

impl RigDb {
    /// Open a local database at the given path (or `:memory:`).
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str, change_buffer: usize) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Must be enabled per connection in SQLite.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let rig_db = Self {
            db,
            conn,
            changes: ChangeFeed::new(change_buffer),
        };
        rig_db.run_migrations().await?;
        Ok(rig_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    #[must_use]
    pub const fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"chk-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
