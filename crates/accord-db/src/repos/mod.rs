//! Repositories for Accord's shared state.
//!
//! `DecisionLedger` and `RelationshipStore` are the only ways the engine
//! mutates state. Both borrow a connection, so the same contract runs on the
//! shared read connection or inside a write transaction.

pub mod audit;
pub mod decision;
pub mod relationship;

pub use decision::DecisionLedger;
pub use relationship::RelationshipStore;
