//! Run-level errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate a whole batch run.
///
/// Per-task problems (timeouts, solver crashes, unparseable output) never
/// appear here; they are recorded as [`TaskOutcome`](crate::TaskOutcome) data.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration rejected before any task started.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input directory could not be listed or an entry resolved.
    #[error("Failed to load work items from '{}': {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report could not be written.
    #[error("Failed to persist report to '{}': {reason}", path.display())]
    Persist { path: PathBuf, reason: String },

    /// The result sink stopped before every outcome was recorded.
    #[error("Result sink stopped unexpectedly: {0}")]
    Sink(String),
}

impl HarnessError {
    /// Build an enumeration error for `path`.
    pub fn enumeration(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Enumeration {
            path: path.into(),
            source,
        }
    }

    /// Build a persistence error for `path`.
    pub fn persist(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Persist {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
