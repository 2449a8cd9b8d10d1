//! batchrun Harness Library
//!
//! Runs an external solver once per input case with bounded parallelism,
//! classifies each run, and stores all outcomes as one report sheet.

pub mod batch;
pub mod config;
pub mod executor;
pub mod json_output;
pub mod orchestrator;
pub mod sink;
pub mod workbook;

pub use batch::{run, run_batch, BatchReport};
pub use config::Config;
pub use executor::{ProcessRunner, TaskError, TaskRunner};
pub use orchestrator::Orchestrator;
pub use sink::{ResultSink, RunSummary, SinkReport};
pub use workbook::{PersistedReport, ReportWriter, Workbook, WorkbookWriter};
