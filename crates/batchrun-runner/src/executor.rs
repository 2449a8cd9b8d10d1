//! Solver execution for a single work item.
//!
//! [`ProcessRunner`] spawns the external solver once per case, waits for it
//! under a deadline, and classifies what happened into a [`TaskOutcome`].
//! Every failure mode ends up as outcome data; nothing here aborts the batch.

use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use batchrun_core::{RunParams, TaskOutcome, TaskResult, WorkItem};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Reasons a single solver run did not produce a result.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Deadline expired; the child was killed.
    #[error("timeout")]
    Timeout,

    /// The solver process could not be started.
    #[error("failed to spawn solver: {0}")]
    Spawn(#[source] io::Error),

    /// Waiting on the child or reading its output failed.
    #[error("failed to collect solver output: {0}")]
    Io(#[source] io::Error),

    /// The solver exited unsuccessfully.
    #[error("{0}")]
    Exit(ExitStatus),

    /// The solver exited zero but its output was not the expected object.
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

/// Runs the task for one work item and classifies it.
///
/// Implementations must return exactly one outcome per call and must not
/// panic on solver misbehaviour.
#[async_trait]
pub trait TaskRunner: Send + Sync + 'static {
    /// Parameters echoed into every outcome this runner produces.
    fn params(&self) -> &RunParams;

    /// Run the task for `item`.
    async fn run(&self, item: WorkItem) -> TaskOutcome;
}

/// Task runner backed by a real child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Solver program, or script when an interpreter is set.
    program: PathBuf,

    /// Interpreter used to launch `program`.
    interpreter: Option<String>,

    params: RunParams,

    /// Wall-clock budget for one solver run.
    timeout: Duration,
}

impl ProcessRunner {
    /// Create a runner for `program` with the given parameters and timeout.
    pub fn new(program: impl Into<PathBuf>, params: RunParams, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            interpreter: None,
            params,
            timeout,
        }
    }

    /// Build the runner described by a batch configuration.
    pub fn from_config(config: &Config) -> Self {
        let runner = Self::new(&config.solver, config.params.clone(), config.timeout);
        match &config.interpreter {
            Some(interpreter) => runner.with_interpreter(interpreter.clone()),
            None => runner,
        }
    }

    /// Launch the solver through an interpreter, e.g. `python`.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    /// Build the solver command line for `item`.
    fn command(&self, item: &WorkItem) -> Command {
        let mut cmd = match &self.interpreter {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(&self.program);
                cmd
            }
            None => Command::new(&self.program),
        };

        cmd.arg("--macro")
            .arg(&self.params.macro_flag)
            .arg("--taboo")
            .arg(&self.params.taboo_flag)
            .arg("--house")
            .arg(item.path())
            .arg("--algorithm")
            .arg(&self.params.algorithm);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run the solver for `item` and parse its result.
    pub async fn execute(&self, item: &WorkItem) -> Result<TaskResult, TaskError> {
        let mut cmd = self.command(item);
        debug!(case = %item, "Full command: {:?}", cmd);

        let mut child = cmd.spawn().map_err(TaskError::Spawn)?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| TaskError::Io(io::Error::other("stdout not captured")))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TaskError::Io(io::Error::other("stderr not captured")))?;

        // Output is read to EOF under the same deadline as the exit, so a
        // grandchild holding the pipes open cannot stall the task.
        let finished = tokio::time::timeout(self.timeout, async {
            let (status, out, err) =
                tokio::join!(child.wait(), read_all(&mut stdout), read_all(&mut stderr));
            let mut combined = out?;
            combined.extend(err?);
            Ok::<_, io::Error>((status?, combined))
        })
        .await;

        let (status, output) = match finished {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => return Err(TaskError::Io(e)),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(case = %item, error = %e, "Failed to kill timed out solver");
                }
                return Err(TaskError::Timeout);
            }
        };

        if !status.success() {
            return Err(TaskError::Exit(status));
        }

        Ok(serde_json::from_slice(&output)?)
    }
}

#[async_trait]
impl TaskRunner for ProcessRunner {
    fn params(&self) -> &RunParams {
        &self.params
    }

    async fn run(&self, item: WorkItem) -> TaskOutcome {
        let started = Instant::now();
        let result = self.execute(&item).await;
        let elapsed = started.elapsed();

        let case = item.case_name();
        let outcome = classify(item, &self.params, result).with_elapsed(elapsed);
        match outcome.error_detail() {
            None => info!(
                case = %case,
                elapsed_ms = elapsed.as_millis() as u64,
                "success"
            ),
            Some(detail) => warn!(
                case = %case,
                status = %outcome.status(),
                elapsed_ms = elapsed.as_millis() as u64,
                "{}", detail
            ),
        }
        outcome
    }
}

/// Map a solver run's result onto an outcome.
pub fn classify(
    item: WorkItem,
    params: &RunParams,
    result: Result<TaskResult, TaskError>,
) -> TaskOutcome {
    match result {
        Ok(result) => TaskOutcome::success(item, params, result),
        Err(TaskError::Timeout) => TaskOutcome::timeout(item, params),
        Err(e) => TaskOutcome::failure(item, params, e.to_string()),
    }
}

async fn read_all<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}
