//! Matching engine.
//!
//! Validates decisions, records them, detects reciprocation and creates or
//! ends relationships. Relationship lifecycle:
//!
//! ```text
//! [none] → active → ended
//! ```
//!
//! Every mutating call holds the party locks of the actors it touches from
//! the first check to the commit, and performs its writes in one `BEGIN
//! IMMEDIATE` transaction. The schema guards in the ledger and store catch
//! whatever slips past the locks (other processes on the same file); their
//! failures are folded back into the normal outcomes below.

use chrono::{DateTime, Utc};
use serde::Serialize;

use accord_core::audit_detail::{DecidedDetail, MatchedDetail, StatusChangedDetail};
use accord_core::entities::{AuditEntry, Decision, Relationship};
use accord_core::enums::{AuditAction, Direction, EntityType, RelationshipStatus, TrailOp};
use accord_core::gate::{ExchangeDenied, authorize_exchange};
use accord_core::ids::PREFIX_AUDIT;
use accord_core::quota::DAILY_LIMIT;
use accord_core::responses::QuotaResponse;
use accord_core::trail::TrailOperation;

use crate::WriteTxn;
use crate::error::{DatabaseError, EngineError, StoreError};
use crate::helpers::{format_timestamp, generate_id};
use crate::quota::QuotaTracker;
use crate::repos::audit::append_audit;
use crate::repos::{DecisionLedger, RelationshipStore};
use crate::service::AccordService;

/// What a committed write produced, plus the trail lines describing it.
struct Committed<T> {
    value: T,
    trail: Vec<TrailOperation>,
}

impl AccordService {
    /// Submit a directional decision by `actor_id` about `target_id`.
    ///
    /// Returns the relationship when the decision completes a mutual accept,
    /// `None` when the decision is only recorded. A caller that loses a race
    /// to create the same pair receives the winner's relationship.
    ///
    /// # Errors
    ///
    /// Fails, in this order of precedence, `SelfReference`,
    /// `ActiveRelationshipExists`, `QuotaExceeded`, `AlreadyDecided`; or
    /// `Storage` on an unexpected storage failure (nothing is written then).
    pub async fn submit_decision(
        &self,
        actor_id: &str,
        target_id: &str,
        direction: Direction,
    ) -> Result<Option<Relationship>, EngineError> {
        if actor_id == target_id {
            return Err(EngineError::SelfReference {
                actor_id: actor_id.to_string(),
            });
        }

        let _parties = self.locks().acquire(&[actor_id, target_id]).await;
        let now = self.now();
        tracing::debug!(actor_id, target_id, %direction, "submitting decision");

        validate_decision(self.db().conn(), actor_id, target_id, now).await?;

        let txn = self.db().begin_write().await?;
        let result = async {
            // Another process may have written between the checks above and
            // taking the write lock.
            validate_decision(txn.conn(), actor_id, target_id, now).await?;
            write_decision(txn.conn(), actor_id, target_id, direction, now).await
        }
        .await;
        let committed = finish(txn, result).await?;

        self.append_trail(&committed.trail);
        Ok(committed.value)
    }

    /// End `relationship_id` on behalf of `actor_id`.
    ///
    /// Returns the relationship in its ENDED state.
    ///
    /// # Errors
    ///
    /// Fails `NotFound`, `NotAParty`, `AlreadyEnded` (checked in that order),
    /// or `Storage`.
    pub async fn terminate(
        &self,
        relationship_id: &str,
        actor_id: &str,
    ) -> Result<Relationship, EngineError> {
        let current = self
            .store()
            .get(relationship_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                relationship_id: relationship_id.to_string(),
            })?;

        let _parties = self
            .locks()
            .acquire(&[current.party_a.as_str(), current.party_b.as_str()])
            .await;
        let now = self.now();

        let txn = self.db().begin_write().await?;
        let result = end_relationship(txn.conn(), relationship_id, actor_id, now).await;
        let committed = finish(txn, result).await?;

        self.append_trail(&committed.trail);
        Ok(committed.value)
    }

    /// The ACTIVE relationship `actor_id` is part of, if any.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the lookup fails.
    pub async fn active_relationship(&self, actor_id: &str) -> Result<Option<Relationship>, EngineError> {
        Ok(self.store().active_for(actor_id).await?)
    }

    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the lookup fails.
    pub async fn has_active_relationship(&self, actor_id: &str) -> Result<bool, EngineError> {
        Ok(self.active_relationship(actor_id).await?.is_some())
    }

    /// Decisions `actor_id` may still submit today (UTC).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the ledger count fails.
    pub async fn remaining_quota(&self, actor_id: &str) -> Result<u32, EngineError> {
        Ok(self.quota().remaining(actor_id, self.now()).await?)
    }

    /// Remaining quota paired with the daily limit and reset instant.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the ledger count fails.
    pub async fn quota_status(&self, actor_id: &str) -> Result<QuotaResponse, EngineError> {
        Ok(self.quota().status(actor_id, self.now()).await?)
    }

    /// Relationships `actor_id` has been part of, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the query fails.
    pub async fn relationship_history(
        &self,
        actor_id: &str,
        limit: u32,
    ) -> Result<Vec<Relationship>, EngineError> {
        Ok(self.store().list_for_actor(actor_id, limit).await?)
    }

    /// Decisions `actor_id` has made, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the query fails.
    pub async fn decision_history(
        &self,
        actor_id: &str,
        limit: u32,
    ) -> Result<Vec<Decision>, EngineError> {
        Ok(self.ledger().list_for_actor(actor_id, limit).await?)
    }

    /// Whether `actor_id` may exchange content inside `relationship_id` now.
    ///
    /// The lookup plus access gate a messaging collaborator runs before every
    /// read or write of conversational content. Membership is checked before
    /// status so outsiders learn nothing about the relationship.
    ///
    /// # Errors
    ///
    /// Fails `NotFound`, `NotAParty` or `AlreadyEnded`; `Storage` on lookup
    /// failure.
    pub async fn exchange_access(
        &self,
        relationship_id: &str,
        actor_id: &str,
    ) -> Result<Relationship, EngineError> {
        let relationship = self
            .store()
            .get(relationship_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                relationship_id: relationship_id.to_string(),
            })?;

        authorize_exchange(&relationship, actor_id).map_err(|denied| match denied {
            ExchangeDenied::NotAParty {
                relationship_id,
                actor_id,
            } => EngineError::NotAParty {
                relationship_id,
                actor_id,
            },
            ExchangeDenied::Inactive { relationship_id } => {
                EngineError::AlreadyEnded { relationship_id }
            }
        })?;
        Ok(relationship)
    }

    /// The database is already committed; a trail failure is logged, not returned.
    fn append_trail(&self, ops: &[TrailOperation]) {
        for op in ops {
            if let Err(e) = self.trail().append(op) {
                tracing::warn!(entity = %op.entity, id = %op.id, error = %e, "trail append failed");
            }
        }
    }
}

/// Busy actor, then quota, then duplicate.
async fn validate_decision(
    conn: &libsql::Connection,
    actor_id: &str,
    target_id: &str,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    if let Some(active) = RelationshipStore::new(conn).active_for(actor_id).await? {
        return Err(EngineError::ActiveRelationshipExists {
            actor_id: actor_id.to_string(),
            relationship_id: active.id,
        });
    }

    if QuotaTracker::new(conn).remaining(actor_id, now).await? == 0 {
        return Err(EngineError::QuotaExceeded {
            actor_id: actor_id.to_string(),
            limit: DAILY_LIMIT,
        });
    }

    if DecisionLedger::new(conn).has_decided(actor_id, target_id).await? {
        return Err(EngineError::AlreadyDecided {
            actor_id: actor_id.to_string(),
            target_id: target_id.to_string(),
        });
    }

    Ok(())
}

/// Record the decision, then match on a reciprocated accept.
async fn write_decision(
    conn: &libsql::Connection,
    actor_id: &str,
    target_id: &str,
    direction: Direction,
    now: DateTime<Utc>,
) -> Result<Committed<Option<Relationship>>, EngineError> {
    let ledger = DecisionLedger::new(conn);
    let decision = ledger.record(actor_id, target_id, direction, now).await?;
    record_audit(
        conn,
        actor_id,
        EntityType::Decision,
        &decision.id,
        AuditAction::Created,
        &DecidedDetail {
            target_id: target_id.to_string(),
            direction: direction.as_str().to_string(),
        },
        now,
    )
    .await?;

    let mut trail = vec![trail_op(
        actor_id,
        TrailOp::Create,
        EntityType::Decision,
        &decision.id,
        &decision,
        now,
    )?];

    if direction == Direction::Reject || !ledger.has_accepted(target_id, actor_id).await? {
        return Ok(Committed { value: None, trail });
    }

    let Some((relationship, created)) = reciprocate(conn, actor_id, target_id, now).await? else {
        return Ok(Committed { value: None, trail });
    };

    if created {
        record_audit(
            conn,
            actor_id,
            EntityType::Relationship,
            &relationship.id,
            AuditAction::Created,
            &MatchedDetail {
                party_a: relationship.party_a.clone(),
                party_b: relationship.party_b.clone(),
            },
            now,
        )
        .await?;
        trail.push(trail_op(
            actor_id,
            TrailOp::Create,
            EntityType::Relationship,
            &relationship.id,
            &relationship,
            now,
        )?);
    }

    Ok(Committed {
        value: Some(relationship),
        trail,
    })
}

/// Create the relationship for a reciprocated accept.
///
/// Returns the relationship and whether this call created it, or `None` when
/// the target is already matched with someone else.
async fn reciprocate(
    conn: &libsql::Connection,
    actor_id: &str,
    target_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<(Relationship, bool)>, EngineError> {
    let store = RelationshipStore::new(conn);

    if let Some(existing) = store.active_for(target_id).await? {
        if existing.involves(actor_id) {
            return Ok(Some((existing, false)));
        }
        tracing::info!(
            actor_id,
            target_id,
            busy_with = %existing.id,
            "reciprocated accept but target is already matched; no relationship"
        );
        return Ok(None);
    }

    match store.create(actor_id, target_id, now).await {
        Ok(relationship) => Ok(Some((relationship, true))),
        Err(StoreError::PairAlreadyActive(existing)) => {
            tracing::warn!(
                relationship_id = %existing.id,
                actor_id,
                target_id,
                "pair matched by a concurrent writer; returning existing relationship"
            );
            Ok(Some((*existing, false)))
        }
        Err(StoreError::PartyAlreadyActive { actor_id: busy }) => {
            tracing::warn!(busy = %busy, actor_id, target_id, "party matched concurrently; no relationship");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn end_relationship(
    conn: &libsql::Connection,
    relationship_id: &str,
    actor_id: &str,
    now: DateTime<Utc>,
) -> Result<Committed<Relationship>, EngineError> {
    let ended = RelationshipStore::new(conn)
        .end(relationship_id, actor_id, now)
        .await?;

    let detail = StatusChangedDetail {
        from: RelationshipStatus::Active.as_str().to_string(),
        to: RelationshipStatus::Ended.as_str().to_string(),
        reason: None,
    };
    record_audit(
        conn,
        actor_id,
        EntityType::Relationship,
        relationship_id,
        AuditAction::StatusChanged,
        &detail,
        now,
    )
    .await?;

    let trail = vec![trail_op(
        actor_id,
        TrailOp::Transition,
        EntityType::Relationship,
        relationship_id,
        &serde_json::json!({
            "from": detail.from,
            "to": detail.to,
            "ended_by": actor_id,
            "ended_at": format_timestamp(now),
        }),
        now,
    )?];

    Ok(Committed {
        value: ended,
        trail,
    })
}

/// Commit on success, roll back on failure.
async fn finish<T>(
    txn: WriteTxn<'_>,
    result: Result<Committed<T>, EngineError>,
) -> Result<Committed<T>, EngineError> {
    match result {
        Ok(committed) => {
            txn.commit().await?;
            Ok(committed)
        }
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}

async fn record_audit<T: Serialize>(
    conn: &libsql::Connection,
    actor_id: &str,
    entity_type: EntityType,
    entity_id: &str,
    action: AuditAction,
    detail: &T,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let entry = AuditEntry {
        id: generate_id(conn, PREFIX_AUDIT).await?,
        actor_id: Some(actor_id.to_string()),
        entity_type,
        entity_id: entity_id.to_string(),
        action,
        detail: Some(serde_json::to_value(detail).map_err(|e| DatabaseError::Other(e.into()))?),
        created_at: now,
    };
    append_audit(conn, &entry).await
}

fn trail_op<T: Serialize>(
    actor_id: &str,
    op: TrailOp,
    entity: EntityType,
    id: &str,
    data: &T,
    now: DateTime<Utc>,
) -> Result<TrailOperation, DatabaseError> {
    Ok(TrailOperation {
        v: 1,
        ts: format_timestamp(now),
        actor: actor_id.to_string(),
        op,
        entity,
        id: id.to_string(),
        data: serde_json::to_value(data).map_err(|e| DatabaseError::Other(e.into()))?,
    })
}
