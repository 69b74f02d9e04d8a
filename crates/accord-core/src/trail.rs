//! JSONL trail operation envelope.
//!
//! When enabled, every engine mutation is also written as a `TrailOperation`
//! to a per-day `{trail_dir}/{YYYY-MM-DD}.jsonl` file, giving downstream
//! consumers an ordered event feed without reading the database.
//!
//! The `v` field supports schema versioning: trail lines without a `v` field
//! deserialize with `v == 1` via `#[serde(default)]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityType, TrailOp};

const fn default_trail_version() -> u32 {
    1
}

/// A single operation recorded in the JSONL trail.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TrailOperation {
    /// Schema version. Defaults to 1.
    #[serde(default = "default_trail_version")]
    pub v: u32,

    /// RFC 3339 timestamp of the operation.
    pub ts: String,

    /// Actor whose request produced this operation.
    pub actor: String,

    /// What kind of mutation this represents.
    pub op: TrailOp,

    /// Which entity type was affected.
    pub entity: EntityType,

    /// ID of the affected entity.
    pub id: String,

    /// Operation payload: the full entity for `Create`, from/to for `Transition`.
    pub data: serde_json::Value,
}
