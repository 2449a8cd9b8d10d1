//! JSON output for streaming run progress to stdout.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use batchrun_core::TaskOutcome;

use crate::sink::RunSummary;

/// Global flag to enable JSON output mode.
static JSON_MODE_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable JSON output mode.
pub fn enable_json_mode() {
    JSON_MODE_ENABLED.store(true, Ordering::SeqCst);
}

/// Check if JSON mode is enabled.
pub fn is_json_mode() -> bool {
    JSON_MODE_ENABLED.load(Ordering::SeqCst)
}

/// JSON event types that can be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonEventType {
    RunStarted,
    TaskFinished,
    RunFinished,
    Error,
}

/// A JSON event to be output to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEvent {
    pub event: JsonEventType,
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl JsonEvent {
    /// Create a new JSON event with the current timestamp.
    pub fn new(event: JsonEventType, data: serde_json::Value) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }

    /// Output this event as a JSON line to stdout.
    pub fn emit(&self) {
        if !is_json_mode() {
            return;
        }
        if let Ok(json) = serde_json::to_string(self) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }
}

/// Build a run_started event.
pub fn run_started(items: usize, concurrency: usize, timeout: Duration) -> JsonEvent {
    JsonEvent::new(
        JsonEventType::RunStarted,
        serde_json::json!({
            "items": items,
            "concurrency": concurrency,
            "timeout_ms": timeout.as_millis() as u64,
        }),
    )
}

/// Build a task_finished event.
pub fn task_finished(outcome: &TaskOutcome) -> JsonEvent {
    let result = outcome.result();
    JsonEvent::new(
        JsonEventType::TaskFinished,
        serde_json::json!({
            "case": outcome.item.case_name(),
            "status": outcome.status(),
            "error": outcome.error_detail(),
            "duration": result.map(|r| r.duration),
            "solution": result.map(|r| r.solution.as_str()),
            "elapsed_ms": outcome.elapsed.as_millis() as u64,
        }),
    )
}

/// Build a run_finished event.
pub fn run_finished(summary: &RunSummary, report: &Path, sheet: &str) -> JsonEvent {
    JsonEvent::new(
        JsonEventType::RunFinished,
        serde_json::json!({
            "summary": summary,
            "report": report.display().to_string(),
            "sheet": sheet,
        }),
    )
}

/// Build an error event.
pub fn error(message: &str) -> JsonEvent {
    JsonEvent::new(
        JsonEventType::Error,
        serde_json::json!({
            "message": message,
        }),
    )
}
