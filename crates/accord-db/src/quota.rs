//! Quota tracker.
//!
//! Pure read over the decision ledger: the count of decisions an actor made
//! since the start of the current UTC day, against `DAILY_LIMIT`. Nothing is
//! materialized.

use chrono::{DateTime, Utc};

use accord_core::quota::{DAILY_LIMIT, next_window_start, remaining, window_start};
use accord_core::responses::QuotaResponse;

use crate::error::DatabaseError;
use crate::repos::DecisionLedger;

pub struct QuotaTracker<'c> {
    ledger: DecisionLedger<'c>,
}

impl<'c> QuotaTracker<'c> {
    #[must_use]
    pub const fn new(conn: &'c libsql::Connection) -> Self {
        Self {
            ledger: DecisionLedger::new(conn),
        }
    }

    /// Decisions `actor_id` may still submit in the window containing `now`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the ledger count fails.
    pub async fn remaining(&self, actor_id: &str, now: DateTime<Utc>) -> Result<u32, DatabaseError> {
        Ok(self.status(actor_id, now).await?.remaining)
    }

    /// Full quota picture for display.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the ledger count fails.
    pub async fn status(&self, actor_id: &str, now: DateTime<Utc>) -> Result<QuotaResponse, DatabaseError> {
        let used = self.ledger.count_since(actor_id, window_start(now)).await?;
        Ok(QuotaResponse {
            remaining: remaining(DAILY_LIMIT, used),
            limit: DAILY_LIMIT,
            used,
            resets_at: next_window_start(now),
        })
    }
}
