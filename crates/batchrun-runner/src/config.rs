//! Harness configuration.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use batchrun_core::{HarnessError, RunParams};

/// Interpreter the default `runner.py` solver is launched with.
pub const DEFAULT_INTERPRETER: &str = "python";

/// Per-task timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Resolved configuration for one batch run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory whose non-directory entries are the work items.
    pub folder: PathBuf,

    /// Macro/taboo flags and algorithm passed to every solver run.
    pub params: RunParams,

    /// Solver program (or script, when `interpreter` is set).
    pub solver: PathBuf,

    /// Interpreter the solver is launched through; `None` executes the
    /// solver directly.
    pub interpreter: Option<String>,

    /// Per-task wall-clock timeout.
    pub timeout: Duration,

    /// Report workbook path.
    pub output: PathBuf,

    /// Maximum number of solver processes running at once.
    pub concurrency: usize,

    /// Emit JSON-lines progress events on stdout.
    pub json: bool,
}

impl Config {
    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<(), HarnessError> {
        check_bool_flag("macro", &self.params.macro_flag)?;
        check_bool_flag("taboo", &self.params.taboo_flag)?;

        if self.params.algorithm.trim().is_empty() {
            return Err(HarnessError::InvalidConfig(
                "algorithm must not be empty".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(HarnessError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(HarnessError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./warehouses"),
            params: RunParams::default(),
            solver: PathBuf::from("./runner.py"),
            interpreter: Some(DEFAULT_INTERPRETER.to_string()),
            timeout: DEFAULT_TIMEOUT,
            output: PathBuf::from("./result.json"),
            concurrency: default_concurrency(),
            json: false,
        }
    }
}

/// Number of available processing units, falling back to 1.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Parse a timeout such as `3m`, `90s`, `1m30s`, `1.5s` or `250ms`.
///
/// A bare number is taken as seconds. Units: `h`, `m`, `s`, `ms`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = text.parse::<f64>() {
        return seconds(secs, input);
    }

    let mut total = 0.0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{input}'"))?;
        let (number, tail) = rest.split_at(split);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid number in duration '{input}'"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, remaining) = tail.split_at(unit_len);
        total += match unit {
            "h" => value * 3600.0,
            "m" => value * 60.0,
            "s" => value,
            "ms" => value / 1000.0,
            other => return Err(format!("unknown unit '{other}' in duration '{input}'")),
        };
        rest = remaining;
    }
    seconds(total, input)
}

fn seconds(secs: f64, input: &str) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs).map_err(|_| format!("duration out of range: '{input}'"))
}

fn check_bool_flag(name: &str, value: &str) -> Result<(), HarnessError> {
    match value {
        "true" | "false" => Ok(()),
        other => Err(HarnessError::InvalidConfig(format!(
            "{name} must be 'true' or 'false', got '{other}'"
        ))),
    }
}
