//! Matching engine settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Directory for the JSONL event trail. Empty disables the trail.
    #[serde(default)]
    pub trail_dir: String,
}

impl EngineConfig {
    /// The trail directory, if the trail is enabled.
    #[must_use]
    pub fn trail_dir(&self) -> Option<PathBuf> {
        let dir = self.trail_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}
