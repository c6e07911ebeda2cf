//! Schedule loading errors.

use std::path::PathBuf;

/// Errors from loading a schedule snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Snapshot file could not be read
    #[error("failed to read schedule {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot was not valid schedule JSON
    #[error("schedule JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
