//! JSONL trail writer.
//!
//! Appends `TrailOperation` records to per-day `{trail_dir}/{YYYY-MM-DD}.jsonl`
//! files. Uses `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use accord_core::trail::TrailOperation;

use crate::error::DatabaseError;

/// Appends trail operations to per-day JSONL files.
pub struct TrailWriter {
    trail_dir: PathBuf,
    enabled: bool,
}

impl TrailWriter {
    /// Create a new `TrailWriter` pointing at the given directory.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created.
    pub fn new(trail_dir: PathBuf) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&trail_dir).map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Self {
            trail_dir,
            enabled: true,
        })
    }

    /// Create a disabled writer.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            trail_dir: PathBuf::new(),
            enabled: false,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append an operation to the file for the UTC day of `op.ts`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if `op.ts` is not RFC 3339 or the write fails.
    pub fn append(&self, op: &TrailOperation) -> Result<(), DatabaseError> {
        if !self.enabled {
            return Ok(());
        }

        let ts = DateTime::parse_from_rfc3339(&op.ts)
            .map_err(|e| DatabaseError::InvalidState(format!("bad trail timestamp '{}': {e}", op.ts)))?
            .with_timezone(&Utc);
        let path = self.day_file(ts.date_naive());
        serde_jsonlines::append_json_lines(&path, [op])
            .map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(())
    }

    /// Read back every operation recorded for `day`. Missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file exists but cannot be parsed.
    pub fn read_day(&self, day: NaiveDate) -> Result<Vec<TrailOperation>, DatabaseError> {
        let path = self.day_file(day);
        if !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines::<TrailOperation, _>(&path)
            .map_err(|e| DatabaseError::Other(e.into()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::Other(e.into()))
    }

    /// The directory where trail files are stored.
    #[must_use]
    pub fn trail_dir(&self) -> &Path {
        &self.trail_dir
    }

    fn day_file(&self, day: NaiveDate) -> PathBuf {
        self.trail_dir.join(format!("{}.jsonl", day.format("%Y-%m-%d")))
    }
}
