//! The top-level batch flow: enumerate, dispatch, collect, persist.

use batchrun_core::{enumerate_work_items, HarnessError, WorkItem};
use chrono::Local;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::Config;
use crate::executor::{ProcessRunner, TaskRunner};
use crate::json_output;
use crate::orchestrator::Orchestrator;
use crate::sink::{ResultSink, RunSummary};
use crate::workbook::{PersistedReport, ReportWriter, WorkbookWriter};

/// Result of a completed batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summary: RunSummary,
    pub persisted: PersistedReport,
}

/// Run `items` through `runner` with at most `concurrency` tasks in flight,
/// then persist the report through `writer` exactly once.
pub async fn run_batch<R, W>(
    items: Vec<WorkItem>,
    runner: R,
    concurrency: usize,
    writer: &mut W,
) -> Result<BatchReport, HarnessError>
where
    R: TaskRunner,
    W: ReportWriter,
{
    let expected = items.len();
    let (outcome_tx, outcome_rx) = mpsc::channel(expected.max(1));
    let sink = ResultSink::new().spawn(outcome_rx);

    let orchestrator = Orchestrator::new(runner, concurrency);
    let published = orchestrator.run(items, outcome_tx).await;

    let report = sink
        .await
        .map_err(|e| HarnessError::Sink(e.to_string()))?;
    check_complete(expected, published, report.summary.total)?;

    let persisted = writer.persist(report.table)?;
    Ok(BatchReport {
        summary: report.summary,
        persisted,
    })
}

/// Refuse to persist unless every item's outcome was published and recorded.
fn check_complete(expected: usize, published: usize, recorded: usize) -> Result<(), HarnessError> {
    if published == expected && recorded == expected {
        return Ok(());
    }
    error!(
        expected = expected,
        published = published,
        recorded = recorded,
        "Outcome count mismatch; report not written"
    );
    Err(HarnessError::Sink(format!(
        "expected {expected} outcomes, {published} published, {recorded} recorded"
    )))
}

/// Run a full batch as described by `config`.
pub async fn run(config: &Config) -> Result<BatchReport, HarnessError> {
    config.validate()?;
    let started_at = Local::now();

    let items = enumerate_work_items(&config.folder)?;
    info!(
        folder = %config.folder.display(),
        items = items.len(),
        solver = %config.solver.display(),
        algorithm = %config.params.algorithm,
        macro_flag = %config.params.macro_flag,
        taboo_flag = %config.params.taboo_flag,
        timeout_ms = config.timeout.as_millis() as u64,
        interpreter = config.interpreter.as_deref().unwrap_or("-"),
        "Starting batch run"
    );
    json_output::run_started(items.len(), config.concurrency, config.timeout).emit();

    let runner = ProcessRunner::from_config(config);
    let mut writer = WorkbookWriter::new(&config.output, started_at);

    let report = run_batch(items, runner, config.concurrency, &mut writer).await?;

    info!(
        total = report.summary.total,
        succeeded = report.summary.succeeded,
        timed_out = report.summary.timed_out,
        failed = report.summary.failed,
        report = %report.persisted.path.display(),
        sheet = %report.persisted.sheet,
        "Batch run finished"
    );
    json_output::run_finished(&report.summary, &report.persisted.path, &report.persisted.sheet)
        .emit();
    Ok(report)
}
