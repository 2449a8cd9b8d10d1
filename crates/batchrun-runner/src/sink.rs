//! Result sink: the single owner of the report table.
//!
//! Outcomes arrive on an mpsc channel in completion order and are appended
//! one at a time by a dedicated consumer, so no two tasks ever touch the
//! table concurrently. The sink hands the finished table back when the
//! channel closes; persisting it is the caller's job and happens once.

use batchrun_core::{ReportTable, TaskOutcome, TaskStatus};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::json_output;

/// Per-status counts for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub timed_out: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, status: TaskStatus) {
        self.total += 1;
        match status {
            TaskStatus::Success => self.succeeded += 1,
            TaskStatus::Timeout => self.timed_out += 1,
            TaskStatus::Failure => self.failed += 1,
        }
    }
}

/// What the sink produced once every outcome was recorded.
#[derive(Debug, Clone)]
pub struct SinkReport {
    pub table: ReportTable,
    pub summary: RunSummary,
}

/// Accumulates outcomes into a [`ReportTable`].
#[derive(Debug, Default)]
pub struct ResultSink {
    table: ReportTable,
    summary: RunSummary,
}

impl ResultSink {
    /// Create a sink whose table holds only the header row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the row for one outcome.
    pub fn record(&mut self, outcome: &TaskOutcome) {
        self.table.append(outcome);
        self.summary.record(outcome.status());
        json_output::task_finished(outcome).emit();
        debug!(
            case = %outcome.item.case_name(),
            status = %outcome.status(),
            rows = self.table.len(),
            "Outcome recorded"
        );
    }

    /// Drain `rx` until every sender is gone, then return the result.
    pub async fn drain(mut self, mut rx: mpsc::Receiver<TaskOutcome>) -> SinkReport {
        while let Some(outcome) = rx.recv().await {
            self.record(&outcome);
        }
        self.finish()
    }

    /// Run [`ResultSink::drain`] as the dedicated consumer task.
    pub fn spawn(self, rx: mpsc::Receiver<TaskOutcome>) -> JoinHandle<SinkReport> {
        tokio::spawn(self.drain(rx))
    }

    /// Stop accepting outcomes and return the table.
    pub fn finish(self) -> SinkReport {
        SinkReport {
            table: self.table,
            summary: self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchrun_core::{Cell, RunParams, TaskResult, WorkItem};

    fn outcomes() -> Vec<TaskOutcome> {
        let params = RunParams::default();
        vec![
            TaskOutcome::success(
                WorkItem::new("/cases/a"),
                &params,
                TaskResult {
                    duration: 1.5,
                    solution: "DDLL".to_string(),
                },
            ),
            TaskOutcome::timeout(WorkItem::new("/cases/b"), &params),
            TaskOutcome::failure(WorkItem::new("/cases/c"), &params, "exit status: 2"),
        ]
    }

    #[test]
    fn test_summary_counts_each_status() {
        let mut sink = ResultSink::new();
        for outcome in outcomes() {
            sink.record(&outcome);
        }
        let report = sink.finish();

        assert_eq!(
            report.summary,
            RunSummary {
                total: 3,
                succeeded: 1,
                timed_out: 1,
                failed: 1,
            }
        );
        assert_eq!(report.table.len(), 3);
    }

    #[tokio::test]
    async fn test_consumer_records_in_arrival_order() {
        let (tx, rx) = mpsc::channel(1);
        let handle = ResultSink::new().spawn(rx);

        let mut sent = outcomes();
        sent.reverse();
        for outcome in sent {
            tx.send(outcome).await.unwrap();
        }
        drop(tx);

        let report = handle.await.unwrap();
        let cases: Vec<&Cell> = report.table.data_rows().iter().map(|r| &r[0]).collect();
        assert_eq!(
            cases,
            vec![&Cell::from("c"), &Cell::from("b"), &Cell::from("a")]
        );
    }

    #[tokio::test]
    async fn test_no_outcomes_leaves_header_only() {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let report = ResultSink::new().drain(rx).await;

        assert!(report.table.is_empty());
        assert_eq!(report.summary, RunSummary::default());
    }
}
