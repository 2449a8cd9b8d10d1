//! Run parameters and per-task outcomes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{TaskStatus, WorkItem};

/// Error text recorded for a task killed at its deadline.
pub const TIMEOUT_DETAIL: &str = "timeout";

/// Fixed parameters shared by every task of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    /// Macro-move flag, passed to the solver as `"true"` or `"false"`.
    pub macro_flag: String,

    /// Taboo-move flag, passed to the solver as `"true"` or `"false"`.
    pub taboo_flag: String,

    /// Search algorithm selector, passed through verbatim.
    pub algorithm: String,
}

impl RunParams {
    /// Create a new RunParams.
    pub fn new(
        macro_flag: impl Into<String>,
        taboo_flag: impl Into<String>,
        algorithm: impl Into<String>,
    ) -> Self {
        Self {
            macro_flag: macro_flag.into(),
            taboo_flag: taboo_flag.into(),
            algorithm: algorithm.into(),
        }
    }
}

impl Default for RunParams {
    fn default() -> Self {
        Self::new("true", "false", "astar")
    }
}

/// The JSON object a solver prints on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Solver-reported search time in seconds.
    pub duration: f64,

    /// Solver-reported solution text.
    pub solution: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Success(TaskResult),
    Timeout,
    Failure(String),
}

/// Result of running one WorkItem.
///
/// Error detail is present iff the task did not succeed; duration and
/// solution are present iff it did. The constructors are the only way to
/// build an outcome, so those rules always hold.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    /// The work item this outcome belongs to.
    pub item: WorkItem,

    /// Macro flag the task ran with.
    pub macro_flag: String,

    /// Algorithm the task ran with.
    pub algorithm: String,

    /// Wall-clock time the harness spent on the task.
    pub elapsed: Duration,

    resolution: Resolution,
}

impl TaskOutcome {
    fn new(item: WorkItem, params: &RunParams, resolution: Resolution) -> Self {
        Self {
            item,
            macro_flag: params.macro_flag.clone(),
            algorithm: params.algorithm.clone(),
            elapsed: Duration::ZERO,
            resolution,
        }
    }

    /// Outcome of a solver run that produced a well-formed result.
    pub fn success(item: WorkItem, params: &RunParams, result: TaskResult) -> Self {
        Self::new(item, params, Resolution::Success(result))
    }

    /// Outcome of a solver run killed at its deadline.
    pub fn timeout(item: WorkItem, params: &RunParams) -> Self {
        Self::new(item, params, Resolution::Timeout)
    }

    /// Outcome of a solver run that failed for any other reason.
    pub fn failure(item: WorkItem, params: &RunParams, detail: impl Into<String>) -> Self {
        Self::new(item, params, Resolution::Failure(detail.into()))
    }

    /// Builder method to record the measured wall-clock time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Classified status.
    pub fn status(&self) -> TaskStatus {
        match self.resolution {
            Resolution::Success(_) => TaskStatus::Success,
            Resolution::Timeout => TaskStatus::Timeout,
            Resolution::Failure(_) => TaskStatus::Failure,
        }
    }

    /// Error text, `None` on success.
    pub fn error_detail(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Success(_) => None,
            Resolution::Timeout => Some(TIMEOUT_DETAIL),
            Resolution::Failure(detail) => Some(detail),
        }
    }

    /// Solver result, `Some` only on success.
    pub fn result(&self) -> Option<&TaskResult> {
        match &self.resolution {
            Resolution::Success(result) => Some(result),
            _ => None,
        }
    }
}
