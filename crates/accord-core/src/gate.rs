//! Access gate for conversational content.
//!
//! Messaging consults the gate before every read or write of content between
//! two actors. The gate never touches storage: the caller performs the
//! relationship lookup and hands the result in.

use thiserror::Error;

use crate::entities::Relationship;

/// May the parties of `relationship` exchange content right now?
///
/// True only for a present relationship whose status is `Active`.
#[must_use]
pub fn can_exchange(relationship: Option<&Relationship>) -> bool {
    relationship.is_some_and(Relationship::is_active)
}

/// Why an actor was refused access to a relationship's content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeDenied {
    /// The caller is not one of the two parties.
    #[error("actor {actor_id} is not a party to relationship {relationship_id}")]
    NotAParty {
        relationship_id: String,
        actor_id: String,
    },

    /// The relationship has ended; the gate is closed for both parties.
    #[error("relationship {relationship_id} is no longer active")]
    Inactive { relationship_id: String },
}

/// Per-actor form of the gate.
///
/// Membership is checked before status so an outsider learns nothing about
/// the relationship's state.
///
/// # Errors
///
/// Returns `ExchangeDenied::NotAParty` if `actor_id` is not a party, or
/// `ExchangeDenied::Inactive` if the relationship has ended.
pub fn authorize_exchange(
    relationship: &Relationship,
    actor_id: &str,
) -> Result<(), ExchangeDenied> {
    if !relationship.involves(actor_id) {
        return Err(ExchangeDenied::NotAParty {
            relationship_id: relationship.id.clone(),
            actor_id: actor_id.to_string(),
        });
    }
    if !can_exchange(Some(relationship)) {
        return Err(ExchangeDenied::Inactive {
            relationship_id: relationship.id.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::RelationshipStatus;
    use chrono::Utc;

    fn relationship(status: RelationshipStatus) -> Relationship {
        Relationship {
            id: "rel-0000000a".into(),
            party_a: "a".into(),
            party_b: "b".into(),
            status,
            created_at: Utc::now(),
            ended_by: None,
            ended_at: None,
        }
    }

    #[test]
    fn closed_without_relationship() {
        assert!(!can_exchange(None));
    }

    #[test]
    fn open_only_while_active() {
        assert!(can_exchange(Some(&relationship(RelationshipStatus::Active))));
        assert!(!can_exchange(Some(&relationship(RelationshipStatus::Ended))));
    }

    #[test]
    fn outsider_is_refused_before_status_is_revealed() {
        let ended = relationship(RelationshipStatus::Ended);
        assert!(matches!(
            authorize_exchange(&ended, "c"),
            Err(ExchangeDenied::NotAParty { .. })
        ));
        assert!(matches!(
            authorize_exchange(&ended, "a"),
            Err(ExchangeDenied::Inactive { .. })
        ));
        assert!(authorize_exchange(&relationship(RelationshipStatus::Active), "b").is_ok());
    }
}
