//! batchrun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Child processes
//! - The async runtime
//! - Report file encoding
//!
//! All types here describe one batch run: the work items it enumerates,
//! the outcome each task produces, and the table those outcomes fill.

pub mod error;
pub mod item;
pub mod outcome;
pub mod report;
pub mod status;

// Re-export commonly used types
pub use error::HarnessError;
pub use item::{enumerate_work_items, WorkItem};
pub use outcome::{RunParams, TaskOutcome, TaskResult};
pub use report::{Cell, ReportTable, REPORT_HEADER};
pub use status::TaskStatus;
