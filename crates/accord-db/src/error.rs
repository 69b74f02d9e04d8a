//! Error types for accord-db.
//!
//! `DatabaseError` covers storage failures. `LedgerError` and `StoreError` are
//! the narrow contracts of the decision ledger and relationship store.
//! `EngineError` is the caller-facing taxonomy; every variant except
//! `Storage` is an input rejection, never a process failure.

use accord_core::enums::ErrorKind;
use accord_core::responses::ErrorResponse;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures of `DecisionLedger::record`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("actor {actor_id} cannot decide about themselves")]
    SelfReference { actor_id: String },

    #[error("actor {actor_id} already decided about {target_id}")]
    DuplicateDecision { actor_id: String, target_id: String },

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl From<libsql::Error> for LedgerError {
    fn from(e: libsql::Error) -> Self {
        Self::Storage(e.into())
    }
}

/// Failures of the relationship store's mutating operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("relationship {relationship_id} not found")]
    NotFound { relationship_id: String },

    #[error("actor {actor_id} is not a party to relationship {relationship_id}")]
    NotAParty {
        relationship_id: String,
        actor_id: String,
    },

    #[error("relationship {relationship_id} has already ended")]
    AlreadyEnded { relationship_id: String },

    /// The pair already has an ACTIVE relationship; carries it.
    #[error("pair already matched in relationship {}", .0.id)]
    PairAlreadyActive(Box<accord_core::entities::Relationship>),

    /// One of the parties is already in a different ACTIVE relationship.
    #[error("actor {actor_id} already has an active relationship")]
    PartyAlreadyActive { actor_id: String },

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl From<libsql::Error> for StoreError {
    fn from(e: libsql::Error) -> Self {
        Self::Storage(e.into())
    }
}

/// Caller-facing engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot submit a decision about yourself")]
    SelfReference { actor_id: String },

    #[error("actor {actor_id} already has an active relationship ({relationship_id})")]
    ActiveRelationshipExists {
        actor_id: String,
        relationship_id: String,
    },

    #[error("daily decision limit of {limit} reached; try again after the next UTC midnight")]
    QuotaExceeded { actor_id: String, limit: u32 },

    #[error("already decided about {target_id}")]
    AlreadyDecided { actor_id: String, target_id: String },

    #[error("relationship {relationship_id} not found")]
    NotFound { relationship_id: String },

    #[error("not a party to relationship {relationship_id}")]
    NotAParty {
        relationship_id: String,
        actor_id: String,
    },

    #[error("relationship {relationship_id} has already ended")]
    AlreadyEnded { relationship_id: String },

    /// Unexpected storage failure. Not retried by the engine.
    #[error("internal storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl EngineError {
    /// Stable kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SelfReference { .. } => ErrorKind::SelfReference,
            Self::ActiveRelationshipExists { .. } => ErrorKind::ActiveRelationshipExists,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Self::AlreadyDecided { .. } => ErrorKind::AlreadyDecided,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotAParty { .. } => ErrorKind::NotAParty,
            Self::AlreadyEnded { .. } => ErrorKind::AlreadyEnded,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Error body for the caller. Storage details are not exposed.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            Self::Storage(_) => "an unexpected error occurred; re-query state before retrying"
                .to_string(),
            other => other.to_string(),
        };
        ErrorResponse::new(self.kind(), message)
    }
}

impl From<libsql::Error> for EngineError {
    fn from(e: libsql::Error) -> Self {
        Self::Storage(e.into())
    }
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::SelfReference { actor_id } => Self::SelfReference { actor_id },
            LedgerError::DuplicateDecision {
                actor_id,
                target_id,
            } => Self::AlreadyDecided {
                actor_id,
                target_id,
            },
            LedgerError::Storage(e) => Self::Storage(e),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { relationship_id } => Self::NotFound { relationship_id },
            StoreError::NotAParty {
                relationship_id,
                actor_id,
            } => Self::NotAParty {
                relationship_id,
                actor_id,
            },
            StoreError::AlreadyEnded { relationship_id } => Self::AlreadyEnded { relationship_id },
            StoreError::PairAlreadyActive(rel) => Self::Storage(DatabaseError::InvalidState(
                format!("unexpected pair conflict on relationship {}", rel.id),
            )),
            StoreError::PartyAlreadyActive { actor_id } => Self::Storage(
                DatabaseError::InvalidState(format!(
                    "unexpected active-party conflict for {actor_id}"
                )),
            ),
            StoreError::Storage(e) => Self::Storage(e),
        }
    }
}
