//! Task outcome status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a task terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Solver exited zero and produced a well-formed result.
    Success,
    /// Solver was killed after exceeding its deadline.
    Timeout,
    /// Solver could not be run, exited abnormally, or produced bad output.
    Failure,
}

impl TaskStatus {
    /// Returns true for [`TaskStatus::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Lowercase name used in logs and JSON events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
