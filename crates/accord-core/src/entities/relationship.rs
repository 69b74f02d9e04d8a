use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::RelationshipStatus;

/// The pairing formed after reciprocated acceptance.
///
/// The pair is unordered: which actor lands in `party_a` is incidental, and
/// every lookup must match either order. Either party may end it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub party_a: String,
    pub party_b: String,
    pub status: RelationshipStatus,
    pub created_at: DateTime<Utc>,
    pub ended_by: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Relationship {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == RelationshipStatus::Active
    }

    /// Whether `actor_id` is one of the two parties.
    #[must_use]
    pub fn involves(&self, actor_id: &str) -> bool {
        self.party_a == actor_id || self.party_b == actor_id
    }

    /// The other party, seen from `actor_id`. `None` if `actor_id` is not a party.
    #[must_use]
    pub fn counterpart(&self, actor_id: &str) -> Option<&str> {
        if self.party_a == actor_id {
            Some(&self.party_b)
        } else if self.party_b == actor_id {
            Some(&self.party_a)
        } else {
            None
        }
    }

    /// The parties in canonical (sorted) order.
    #[must_use]
    pub fn pair_key(&self) -> (&str, &str) {
        pair_key(&self.party_a, &self.party_b)
    }
}

/// Canonical ordering of an unordered pair.
#[must_use]
pub fn pair_key<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y { (x, y) } else { (y, x) }
}
