use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Direction;

/// A one-time directional choice one actor made about another.
///
/// Append-only: at most one exists per ordered `(actor_id, target_id)` pair and
/// it is never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Decision {
    pub id: String,
    pub actor_id: String,
    pub target_id: String,
    pub direction: Direction,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    #[must_use]
    pub fn is_accept(&self) -> bool {
        self.direction == Direction::Accept
    }
}
