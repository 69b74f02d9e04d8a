//! ID prefixes for Accord entities.
//!
//! IDs are `{prefix}-{8 hex chars}`, e.g. `rel-a3f8b2c1`. The random part is
//! produced by libSQL (`lower(hex(randomblob(4)))`); see `AccordDb::generate_id`.
//! Actor IDs are opaque and supplied by the identity collaborator; they carry
//! no prefix.

pub const PREFIX_DECISION: &str = "dec";
pub const PREFIX_RELATIONSHIP: &str = "rel";
pub const PREFIX_AUDIT: &str = "aud";

/// Every prefix issued by the engine.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_DECISION, PREFIX_RELATIONSHIP, PREFIX_AUDIT];

/// Check whether `id` looks like an engine-issued ID with the given prefix.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for prefix in ALL_PREFIXES {
            assert!(seen.insert(*prefix), "duplicate prefix {prefix}");
            assert_eq!(prefix.len(), 3);
        }
    }

    #[test]
    fn has_prefix_checks_shape() {
        assert!(has_prefix("rel-a3f8b2c1", PREFIX_RELATIONSHIP));
        assert!(!has_prefix("rel-a3f8b2c", PREFIX_RELATIONSHIP));
        assert!(!has_prefix("rel-a3f8b2cz", PREFIX_RELATIONSHIP));
        assert!(!has_prefix("dec-a3f8b2c1", PREFIX_RELATIONSHIP));
        assert!(!has_prefix("rela3f8b2c1", PREFIX_RELATIONSHIP));
    }
}
