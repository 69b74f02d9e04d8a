//! Response shapes handed to request handlers.
//!
//! Handlers serialize these as-is. Relationship views are always resolved
//! relative to the caller so they name the counterpart, not both parties.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Relationship;
use crate::enums::{ErrorKind, Guidance, RelationshipStatus};

/// A relationship as seen by one of its parties.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RelationshipView {
    pub relationship_id: String,
    pub counterpart_id: String,
    pub status: RelationshipStatus,
    pub created_at: DateTime<Utc>,
    pub ended_by: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl RelationshipView {
    /// Build the view for `actor_id`. `None` if `actor_id` is not a party.
    #[must_use]
    pub fn for_actor(relationship: &Relationship, actor_id: &str) -> Option<Self> {
        let counterpart = relationship.counterpart(actor_id)?;
        Some(Self {
            relationship_id: relationship.id.clone(),
            counterpart_id: counterpart.to_string(),
            status: relationship.status,
            created_at: relationship.created_at,
            ended_by: relationship.ended_by.clone(),
            ended_at: relationship.ended_at,
        })
    }
}

/// Response to a submitted decision.
///
/// `matched` distinguishes "decision recorded" from "relationship created".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DecisionResponse {
    pub matched: bool,
    pub relationship: Option<RelationshipView>,
}

impl DecisionResponse {
    #[must_use]
    pub const fn recorded() -> Self {
        Self {
            matched: false,
            relationship: None,
        }
    }

    #[must_use]
    pub fn from_relationship(relationship: Option<&Relationship>, actor_id: &str) -> Self {
        match relationship.and_then(|rel| RelationshipView::for_actor(rel, actor_id)) {
            Some(view) => Self {
                matched: true,
                relationship: Some(view),
            },
            None => Self::recorded(),
        }
    }
}

/// Response to an active-relationship lookup.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ActiveRelationshipResponse {
    pub relationship: Option<RelationshipView>,
}

/// Remaining daily quota, paired with the fixed limit for client display.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct QuotaResponse {
    pub remaining: u32,
    pub limit: u32,
    pub used: u32,
    pub resets_at: DateTime<Utc>,
}

/// Stable error body for a rejected request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
    pub guidance: Guidance,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            guidance: kind.guidance(),
        }
    }
}
