//! JSONL event trail.
//!
//! An optional, ordered feed of committed engine mutations, one file per UTC
//! day in the configured directory. The database stays the source of truth.

pub mod writer;
