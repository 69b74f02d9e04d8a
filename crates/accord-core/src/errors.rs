//! Cross-cutting error types for Accord.
//!
//! Storage and engine errors (`DatabaseError`, `EngineError`) live in
//! `accord-db`. This module only holds failures that can arise from pure
//! value handling in any crate.

use thiserror::Error;

/// Errors that can be raised by any Accord crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (unknown enum text, malformed input).
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::CoreError;
    use crate::enums::Direction;

    #[test]
    fn unknown_direction_is_a_validation_error() {
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref msg) if msg.contains("sideways")));
        assert!(err.to_string().starts_with("Validation error:"));
    }
}
