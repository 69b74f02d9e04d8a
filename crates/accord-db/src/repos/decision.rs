//! Decision ledger.
//!
//! Append-only record of every directional decision. At most one decision per
//! ordered `(actor, target)` pair ever exists; a second attempt is rejected,
//! never overwritten. There is no update or delete API, and the schema rejects
//! both at the storage level.

use chrono::{DateTime, Utc};

use accord_core::entities::Decision;
use accord_core::enums::Direction;
use accord_core::ids::PREFIX_DECISION;

use crate::error::{DatabaseError, LedgerError};
use crate::helpers::{
    Violation, classify_violation, format_timestamp, generate_id, get_count, parse_datetime,
    parse_enum,
};

const DECISION_COLUMNS: &str = "id, actor_id, target_id, direction, decided_at";

fn row_to_decision(row: &libsql::Row) -> Result<Decision, DatabaseError> {
    Ok(Decision {
        id: row.get::<String>(0)?,
        actor_id: row.get::<String>(1)?,
        target_id: row.get::<String>(2)?,
        direction: parse_enum(&row.get::<String>(3)?)?,
        decided_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

/// Ledger contract over a borrowed connection.
pub struct DecisionLedger<'c> {
    conn: &'c libsql::Connection,
}

impl<'c> DecisionLedger<'c> {
    #[must_use]
    pub const fn new(conn: &'c libsql::Connection) -> Self {
        Self { conn }
    }

    /// Append a decision.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::SelfReference` if `actor_id == target_id`,
    /// `LedgerError::DuplicateDecision` if the ordered pair already has a
    /// decision (including one committed concurrently by another writer), and
    /// `LedgerError::Storage` for anything else.
    pub async fn record(
        &self,
        actor_id: &str,
        target_id: &str,
        direction: Direction,
        decided_at: DateTime<Utc>,
    ) -> Result<Decision, LedgerError> {
        if actor_id == target_id {
            return Err(LedgerError::SelfReference {
                actor_id: actor_id.to_string(),
            });
        }

        let id = generate_id(self.conn, PREFIX_DECISION).await?;
        let inserted = self
            .conn
            .execute(
                "INSERT INTO decisions (id, actor_id, target_id, direction, decided_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    id.as_str(),
                    actor_id,
                    target_id,
                    direction.as_str(),
                    format_timestamp(decided_at)
                ],
            )
            .await;

        if let Err(e) = inserted {
            return Err(match classify_violation(&e) {
                Some(Violation::DuplicateDecision) => LedgerError::DuplicateDecision {
                    actor_id: actor_id.to_string(),
                    target_id: target_id.to_string(),
                },
                _ => e.into(),
            });
        }

        tracing::debug!(%id, actor_id, target_id, %direction, "decision recorded");
        Ok(Decision {
            id,
            actor_id: actor_id.to_string(),
            target_id: target_id.to_string(),
            direction,
            decided_at,
        })
    }

    /// Whether `actor_id` has decided about `target_id`, in either direction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn has_decided(&self, actor_id: &str, target_id: &str) -> Result<bool, DatabaseError> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM decisions WHERE actor_id = ?1 AND target_id = ?2)",
            actor_id,
            target_id,
        )
        .await
    }

    /// Whether `actor_id` accepted `target_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn has_accepted(&self, actor_id: &str, target_id: &str) -> Result<bool, DatabaseError> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM decisions
                           WHERE actor_id = ?1 AND target_id = ?2 AND direction = 'accept')",
            actor_id,
            target_id,
        )
        .await
    }

    /// Number of decisions `actor_id` made at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_since(&self, actor_id: &str, since: DateTime<Utc>) -> Result<u32, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM decisions WHERE actor_id = ?1 AND decided_at >= ?2",
                libsql::params![actor_id, format_timestamp(since)],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_count(&row, 0)
    }

    /// The decision `actor_id` made about `target_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get(&self, actor_id: &str, target_id: &str) -> Result<Option<Decision>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {DECISION_COLUMNS} FROM decisions WHERE actor_id = ?1 AND target_id = ?2"
                ),
                [actor_id, target_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_decision(&row)?)),
            None => Ok(None),
        }
    }

    /// Decisions made by `actor_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_for_actor(&self, actor_id: &str, limit: u32) -> Result<Vec<Decision>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {DECISION_COLUMNS} FROM decisions WHERE actor_id = ?1
                     ORDER BY decided_at DESC, id DESC LIMIT ?2"
                ),
                libsql::params![actor_id, limit],
            )
            .await?;

        let mut decisions = Vec::new();
        while let Some(row) = rows.next().await? {
            decisions.push(row_to_decision(&row)?);
        }
        Ok(decisions)
    }

    async fn exists(&self, sql: &str, actor_id: &str, target_id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self.conn.query(sql, [actor_id, target_id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)? != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{at, test_db};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn record_and_read_back() {
        let db = test_db().await;
        let ledger = DecisionLedger::new(db.conn());
        let when = at(2026, 3, 4, 9, 0);

        let decision = ledger
            .record("ana", "ben", Direction::Accept, when)
            .await
            .unwrap();
        assert!(decision.id.starts_with("dec-"));
        assert!(decision.is_accept());

        let stored = ledger.get("ana", "ben").await.unwrap().unwrap();
        assert_eq!(stored, decision);
        assert!(ledger.get("ben", "ana").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ordered_pair_lookups() {
        let db = test_db().await;
        let ledger = DecisionLedger::new(db.conn());
        let when = at(2026, 3, 4, 9, 0);
        ledger.record("ana", "ben", Direction::Accept, when).await.unwrap();
        ledger.record("ana", "cat", Direction::Reject, when).await.unwrap();

        assert!(ledger.has_decided("ana", "ben").await.unwrap());
        assert!(!ledger.has_decided("ben", "ana").await.unwrap());

        assert!(ledger.has_accepted("ana", "ben").await.unwrap());
        assert!(ledger.has_decided("ana", "cat").await.unwrap());
        assert!(!ledger.has_accepted("ana", "cat").await.unwrap());
    }

    #[tokio::test]
    async fn second_decision_on_same_pair_is_rejected() {
        let db = test_db().await;
        let ledger = DecisionLedger::new(db.conn());
        let when = at(2026, 3, 4, 9, 0);
        ledger.record("ana", "ben", Direction::Reject, when).await.unwrap();

        let err = ledger
            .record("ana", "ben", Direction::Accept, when)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateDecision { .. }), "{err:?}");

        // First decision stands.
        let stored = ledger.get("ana", "ben").await.unwrap().unwrap();
        assert_eq!(stored.direction, Direction::Reject);
    }

    #[tokio::test]
    async fn self_reference_is_rejected() {
        let db = test_db().await;
        let ledger = DecisionLedger::new(db.conn());
        let err = ledger
            .record("ana", "ana", Direction::Accept, at(2026, 3, 4, 9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::SelfReference { .. }));
        assert!(!ledger.has_decided("ana", "ana").await.unwrap());
    }

    #[tokio::test]
    async fn count_since_respects_boundary() {
        let db = test_db().await;
        let ledger = DecisionLedger::new(db.conn());
        ledger.record("ana", "b1", Direction::Accept, at(2026, 3, 3, 23, 59)).await.unwrap();
        ledger.record("ana", "b2", Direction::Reject, at(2026, 3, 4, 0, 0)).await.unwrap();
        ledger.record("ana", "b3", Direction::Accept, at(2026, 3, 4, 12, 0)).await.unwrap();
        ledger.record("zoe", "b1", Direction::Accept, at(2026, 3, 4, 12, 0)).await.unwrap();

        assert_eq!(ledger.count_since("ana", at(2026, 3, 4, 0, 0)).await.unwrap(), 2);
        assert_eq!(ledger.count_since("ana", at(2026, 3, 3, 0, 0)).await.unwrap(), 3);
        assert_eq!(ledger.count_since("nobody", at(2026, 3, 3, 0, 0)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_for_actor_newest_first() {
        let db = test_db().await;
        let ledger = DecisionLedger::new(db.conn());
        ledger.record("ana", "b1", Direction::Accept, at(2026, 3, 4, 8, 0)).await.unwrap();
        ledger.record("ana", "b2", Direction::Reject, at(2026, 3, 4, 9, 0)).await.unwrap();
        ledger.record("ana", "b3", Direction::Accept, at(2026, 3, 4, 10, 0)).await.unwrap();

        let listed = ledger.list_for_actor("ana", 2).await.unwrap();
        let targets: Vec<&str> = listed.iter().map(|d| d.target_id.as_str()).collect();
        assert_eq!(targets, vec!["b3", "b2"]);
    }
}
