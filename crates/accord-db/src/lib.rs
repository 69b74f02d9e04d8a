//! # accord-db
//!
//! libSQL storage and the matching engine for Accord.
//!
//! Holds the two shared mutable resources of the system, the decision ledger
//! and the relationship store, plus the audit trail. All mutation goes through
//! the narrow repo contracts in [`repos`]; the engine in [`engine`] orchestrates
//! them under party-scoped locks and `BEGIN IMMEDIATE` write transactions.
//!
//! Uses the `libsql` crate (C `SQLite` fork) in local mode.

pub mod engine;
pub mod error;
pub mod helpers;
pub mod locks;
mod migrations;
pub mod quota;
pub mod repos;
pub mod service;
pub mod trail;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use error::DatabaseError;
use libsql::{Builder, TransactionBehavior};
use tokio::sync::{Mutex, MutexGuard};

/// Busy timeout used when none is configured.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Central database handle for all Accord state.
///
/// Wraps a libSQL database and one shared connection. Write transactions on
/// the shared connection are serialized by an in-process gate; `BEGIN
/// IMMEDIATE` serializes them against other processes using the same file.
pub struct AccordDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    write_gate: Mutex<()>,
}

impl AccordDb {
    /// Open a local database at the given path with the default busy timeout.
    ///
    /// Runs migrations automatically.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        Self::open_local_with(path, DEFAULT_BUSY_TIMEOUT).await
    }

    /// Open a local database with an explicit busy timeout.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local_with(path: &str, busy_timeout: Duration) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Per-connection in SQLite
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;
        let timeout_ms = u64::try_from(busy_timeout.as_millis()).unwrap_or(u64::MAX);
        // Returns the new value as a row; step it so the pragma runs.
        {
            let mut applied = conn
                .query(&format!("PRAGMA busy_timeout = {timeout_ms}"), ())
                .await
                .map_err(|e| DatabaseError::Migration(format!("PRAGMA busy_timeout: {e}")))?;
            applied.next().await?;
        }

        let accord_db = Self {
            db,
            conn,
            write_gate: Mutex::new(()),
        };
        accord_db.run_migrations().await?;
        tracing::debug!(path, "opened accord database");
        Ok(accord_db)
    }

    /// Access the underlying libSQL connection for reads.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"rel-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        helpers::generate_id(&self.conn, prefix).await
    }

    /// Open a write transaction (`BEGIN IMMEDIATE`).
    ///
    /// Waits for any other in-process write transaction to finish first. The
    /// returned handle must be committed or rolled back explicitly.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction cannot be started (for
    /// example, another process holds the write lock past the busy timeout).
    pub async fn begin_write(&self) -> Result<WriteTxn<'_>, DatabaseError> {
        let gate = self.write_gate.lock().await;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;
        Ok(WriteTxn { _gate: gate, tx })
    }
}

/// An open `BEGIN IMMEDIATE` transaction holding the in-process write gate.
pub struct WriteTxn<'a> {
    _gate: MutexGuard<'a, ()>,
    tx: libsql::Transaction,
}

impl WriteTxn<'_> {
    /// Connection view bound to this transaction.
    #[must_use]
    pub fn conn(&self) -> &libsql::Connection {
        &self.tx
    }

    /// Commit and release the write gate.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the commit fails.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Roll back and release the write gate.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the rollback fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
