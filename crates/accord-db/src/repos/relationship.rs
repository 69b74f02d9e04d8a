//! Relationship store.
//!
//! Holds relationships between unordered actor pairs. A relationship is
//! created ACTIVE and moves once, to ENDED. Two storage guards back the
//! engine's checks: the partial unique index on the active pair and the
//! `active_parties` table (one row per actor in an ACTIVE relationship).
//! `create` and `end` each run inside a savepoint so they are atomic on their
//! own and nest inside the engine's write transaction.

use chrono::{DateTime, Utc};

use accord_core::entities::{Relationship, pair_key};
use accord_core::enums::RelationshipStatus;
use accord_core::ids::PREFIX_RELATIONSHIP;

use crate::error::{DatabaseError, StoreError};
use crate::helpers::{
    Violation, classify_violation, format_timestamp, generate_id, get_opt_string,
    parse_datetime, parse_enum, parse_optional_datetime,
};

const RELATIONSHIP_COLUMNS: &str = "id, party_a, party_b, status, created_at, ended_by, ended_at";

fn row_to_relationship(row: &libsql::Row) -> Result<Relationship, DatabaseError> {
    Ok(Relationship {
        id: row.get::<String>(0)?,
        party_a: row.get::<String>(1)?,
        party_b: row.get::<String>(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        ended_by: get_opt_string(row, 5)?,
        ended_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
    })
}

/// Relationship store contract over a borrowed connection.
pub struct RelationshipStore<'c> {
    conn: &'c libsql::Connection,
}

impl<'c> RelationshipStore<'c> {
    #[must_use]
    pub const fn new(conn: &'c libsql::Connection) -> Self {
        Self { conn }
    }

    /// The ACTIVE relationship `actor_id` is part of, if any.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn active_for(&self, actor_id: &str) -> Result<Option<Relationship>, DatabaseError> {
        self.query_one(
            &format!(
                "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
                 WHERE status = 'active' AND (party_a = ?1 OR party_b = ?1)
                 LIMIT 1"
            ),
            libsql::params![actor_id],
        )
        .await
    }

    /// Order-independent pair lookup. Prefers the ACTIVE relationship, then
    /// the most recently created one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_by_pair(&self, x: &str, y: &str) -> Result<Option<Relationship>, DatabaseError> {
        let (low, high) = pair_key(x, y);
        self.query_one(
            &format!(
                "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
                 WHERE pair_low = ?1 AND pair_high = ?2
                 ORDER BY status = 'active' DESC, created_at DESC
                 LIMIT 1"
            ),
            libsql::params![low, high],
        )
        .await
    }

    /// Fetch a relationship by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get(&self, relationship_id: &str) -> Result<Option<Relationship>, DatabaseError> {
        self.query_one(
            &format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE id = ?1"),
            libsql::params![relationship_id],
        )
        .await
    }

    /// Relationships `actor_id` has been part of, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_for_actor(
        &self,
        actor_id: &str,
        limit: u32,
    ) -> Result<Vec<Relationship>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
                     WHERE party_a = ?1 OR party_b = ?1
                     ORDER BY created_at DESC, id DESC LIMIT ?2"
                ),
                libsql::params![actor_id, limit],
            )
            .await?;

        let mut relationships = Vec::new();
        while let Some(row) = rows.next().await? {
            relationships.push(row_to_relationship(&row)?);
        }
        Ok(relationships)
    }

    /// Create an ACTIVE relationship between `x` and `y`.
    ///
    /// The caller establishes that neither party is already busy; the schema
    /// re-checks it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PairAlreadyActive` carrying the existing row if the
    /// pair is already matched, `StoreError::PartyAlreadyActive` if either
    /// party is in another ACTIVE relationship, and `StoreError::Storage`
    /// otherwise. On error nothing is written.
    pub async fn create(
        &self,
        x: &str,
        y: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Relationship, StoreError> {
        let id = generate_id(self.conn, PREFIX_RELATIONSHIP).await?;
        let (low, high) = pair_key(x, y);

        self.conn.execute("SAVEPOINT relationship_create", ()).await?;
        match self.insert_active(&id, x, y, low, high, created_at).await {
            Ok(()) => {
                self.conn.execute("RELEASE relationship_create", ()).await?;
            }
            Err(violation) => {
                self.conn
                    .execute("ROLLBACK TO relationship_create", ())
                    .await?;
                self.conn.execute("RELEASE relationship_create", ()).await?;
                return Err(self.resolve_create_conflict(violation, x, y).await);
            }
        }

        tracing::info!(%id, party_a = x, party_b = y, "relationship created");
        Ok(Relationship {
            id,
            party_a: x.to_string(),
            party_b: y.to_string(),
            status: RelationshipStatus::Active,
            created_at,
            ended_by: None,
            ended_at: None,
        })
    }

    /// End an ACTIVE relationship on behalf of one of its parties.
    ///
    /// # Errors
    ///
    /// Fails, in this order, `StoreError::NotFound`, `StoreError::NotAParty`,
    /// `StoreError::AlreadyEnded`; `StoreError::Storage` on storage failure.
    pub async fn end(
        &self,
        relationship_id: &str,
        ending_actor_id: &str,
        ended_at: DateTime<Utc>,
    ) -> Result<Relationship, StoreError> {
        let current = self
            .get(relationship_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                relationship_id: relationship_id.to_string(),
            })?;

        if !current.involves(ending_actor_id) {
            return Err(StoreError::NotAParty {
                relationship_id: relationship_id.to_string(),
                actor_id: ending_actor_id.to_string(),
            });
        }
        if !current.status.can_transition_to(RelationshipStatus::Ended) {
            return Err(StoreError::AlreadyEnded {
                relationship_id: relationship_id.to_string(),
            });
        }

        self.conn.execute("SAVEPOINT relationship_end", ()).await?;
        let changed = match self.mark_ended(relationship_id, ending_actor_id, ended_at).await {
            Ok(changed) => changed,
            Err(e) => {
                self.conn.execute("ROLLBACK TO relationship_end", ()).await?;
                self.conn.execute("RELEASE relationship_end", ()).await?;
                return Err(e.into());
            }
        };
        self.conn.execute("RELEASE relationship_end", ()).await?;

        // Another writer ended it between our read and our update.
        if changed == 0 {
            return Err(StoreError::AlreadyEnded {
                relationship_id: relationship_id.to_string(),
            });
        }

        tracing::info!(relationship_id, ended_by = ending_actor_id, "relationship ended");
        Ok(Relationship {
            status: RelationshipStatus::Ended,
            ended_by: Some(ending_actor_id.to_string()),
            ended_at: Some(ended_at),
            ..current
        })
    }

    async fn insert_active(
        &self,
        id: &str,
        x: &str,
        y: &str,
        low: &str,
        high: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), libsql::Error> {
        self.conn
            .execute(
                "INSERT INTO relationships (id, party_a, party_b, pair_low, pair_high, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'active', ?6)",
                libsql::params![id, x, y, low, high, format_timestamp(created_at)],
            )
            .await?;
        for party in [x, y] {
            self.conn
                .execute(
                    "INSERT INTO active_parties (actor_id, relationship_id) VALUES (?1, ?2)",
                    [party, id],
                )
                .await?;
        }
        Ok(())
    }

    async fn mark_ended(
        &self,
        relationship_id: &str,
        ending_actor_id: &str,
        ended_at: DateTime<Utc>,
    ) -> Result<u64, libsql::Error> {
        let changed = self
            .conn
            .execute(
                "UPDATE relationships SET status = 'ended', ended_by = ?1, ended_at = ?2
                 WHERE id = ?3 AND status = 'active'",
                libsql::params![ending_actor_id, format_timestamp(ended_at), relationship_id],
            )
            .await?;
        self.conn
            .execute(
                "DELETE FROM active_parties WHERE relationship_id = ?1",
                [relationship_id],
            )
            .await?;
        Ok(changed)
    }

    /// Turn a failed create into the store's contract error.
    async fn resolve_create_conflict(&self, e: libsql::Error, x: &str, y: &str) -> StoreError {
        match classify_violation(&e) {
            Some(Violation::ActivePair) => match self.find_by_pair(x, y).await {
                Ok(Some(existing)) if existing.is_active() => {
                    StoreError::PairAlreadyActive(Box::new(existing))
                }
                Ok(_) => StoreError::Storage(DatabaseError::InvalidState(format!(
                    "active pair conflict for {x}/{y} but no active row found"
                ))),
                Err(lookup) => StoreError::Storage(lookup),
            },
            Some(Violation::ActiveParty) => {
                let busy = match self.active_for(x).await {
                    Ok(Some(_)) => x,
                    _ => y,
                };
                StoreError::PartyAlreadyActive {
                    actor_id: busy.to_string(),
                }
            }
            _ => StoreError::Storage(e.into()),
        }
    }

    async fn query_one(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Option<Relationship>, DatabaseError> {
        let mut rows = self.conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_relationship(&row)?)),
            None => Ok(None),
        }
    }
}
