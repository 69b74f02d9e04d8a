//! Service layer wiring storage, trail, locks and time together.
//!
//! `AccordService` wraps `AccordDb` (raw database access), `TrailWriter`
//! (optional JSONL feed), `PartyLocks` (per-actor exclusion) and a `Clock`.
//! The matching engine is implemented as `impl AccordService` in
//! [`crate::engine`]; the service itself holds no domain state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};

use accord_core::clock::{Clock, SystemClock};

use crate::AccordDb;
use crate::error::DatabaseError;
use crate::locks::PartyLocks;
use crate::quota::QuotaTracker;
use crate::repos::{DecisionLedger, RelationshipStore};
use crate::trail::writer::TrailWriter;

/// Orchestrates engine mutations with audit trail and JSONL trail.
///
/// Every mutation follows this protocol:
/// 1. Lock the parties involved
/// 2. Validate against current state
/// 3. Begin an IMMEDIATE transaction
/// 4. Write through the ledger or store, appending audit entries
/// 5. Commit, then append the JSONL trail operations
pub struct AccordService {
    db: AccordDb,
    trail: TrailWriter,
    locks: PartyLocks,
    clock: Arc<dyn Clock>,
}

impl AccordService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `trail_dir` - Directory for JSONL trail files. `None` disables the trail.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the trail
    /// directory cannot be created.
    pub async fn new_local(db_path: &str, trail_dir: Option<PathBuf>) -> Result<Self, DatabaseError> {
        Self::new_local_with(db_path, crate::DEFAULT_BUSY_TIMEOUT, trail_dir).await
    }

    /// Like [`Self::new_local`] with an explicit busy timeout.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the trail
    /// directory cannot be created.
    pub async fn new_local_with(
        db_path: &str,
        busy_timeout: Duration,
        trail_dir: Option<PathBuf>,
    ) -> Result<Self, DatabaseError> {
        let db = AccordDb::open_local_with(db_path, busy_timeout).await?;
        let trail = match trail_dir {
            Some(dir) => TrailWriter::new(dir)?,
            None => TrailWriter::disabled(),
        };
        Ok(Self::from_db(db, trail))
    }

    /// Create from an existing `AccordDb`.
    #[must_use]
    pub fn from_db(db: AccordDb, trail: TrailWriter) -> Self {
        Self {
            db,
            trail,
            locks: PartyLocks::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &AccordDb {
        &self.db
    }

    /// Access the trail writer.
    #[must_use]
    pub const fn trail(&self) -> &TrailWriter {
        &self.trail
    }

    #[must_use]
    pub const fn locks(&self) -> &PartyLocks {
        &self.locks
    }

    /// Current instant according to the service clock, truncated to the
    /// microsecond precision timestamps are stored with.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    /// Decision ledger on the shared read connection.
    #[must_use]
    pub const fn ledger(&self) -> DecisionLedger<'_> {
        DecisionLedger::new(self.db.conn())
    }

    /// Relationship store on the shared read connection.
    #[must_use]
    pub const fn store(&self) -> RelationshipStore<'_> {
        RelationshipStore::new(self.db.conn())
    }

    /// Quota tracker on the shared read connection.
    #[must_use]
    pub const fn quota(&self) -> QuotaTracker<'_> {
        QuotaTracker::new(self.db.conn())
    }
}
