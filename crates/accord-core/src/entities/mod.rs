//! Entity structs for all Accord domain objects.
//!
//! Each entity maps to a table in the libSQL database. Entities reference one
//! another by ID only; there are no back-pointers. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip and schema
//! validation.

mod audit;
mod decision;
mod relationship;

pub use audit::AuditEntry;
pub use decision::Decision;
pub use relationship::{Relationship, pair_key};
