//! # accord-core
//!
//! Core types for Accord, the mutual opt-in matching engine.
//!
//! This crate provides the foundational types shared across all Accord crates:
//! - Entity structs (decisions, relationships, audit entries)
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - The fixed daily quota policy and its UTC window math
//! - The access gate consulted by messaging before any exchange
//! - Response and error shapes handed to request handlers
//! - Trail operation envelope for JSONL persistence
//!
//! Nothing here performs IO.

pub mod audit_detail;
pub mod clock;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod gate;
pub mod ids;
pub mod quota;
pub mod responses;
pub mod trail;
