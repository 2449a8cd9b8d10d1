//! Report persistence.
//!
//! Reports are stored in a JSON workbook holding one named sheet per run.
//! Opening an existing workbook keeps its earlier sheets, so re-running
//! against the same output path accumulates history instead of overwriting.

use std::fs;
use std::path::{Path, PathBuf};

use batchrun_core::{HarnessError, ReportTable};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Sheet name format: local start time, second resolution.
const SHEET_NAME_FORMAT: &str = "%Y%m%d%H%M%S";

/// One run's table inside a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub table: ReportTable,
}

/// A collection of named sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Load the workbook at `path`, or start an empty one.
    ///
    /// A missing file is the normal first-run case. A file that exists but
    /// cannot be read or parsed is replaced on the next save.
    pub fn open_or_create(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read existing report; starting a new workbook");
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(workbook) => workbook,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Existing report is not a workbook; starting a new one");
                Self::default()
            }
        }
    }

    /// Add `table` as a new sheet and return the name it was stored under.
    ///
    /// If `name` is taken, `-2`, `-3`, ... is appended until it is unique.
    pub fn add_sheet(&mut self, name: &str, table: ReportTable) -> String {
        let mut unique = name.to_string();
        let mut n = 2;
        while self.sheet(&unique).is_some() {
            unique = format!("{name}-{n}");
            n += 1;
        }
        self.sheets.push(Sheet {
            name: unique.clone(),
            table,
        });
        unique
    }

    /// Look up a sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Write the workbook to `path` via a sibling temp file and rename.
    pub fn save(&self, path: &Path) -> Result<(), HarnessError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| HarnessError::persist(path, e.to_string()))?;

        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(|e| HarnessError::persist(path, e.to_string()))?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(HarnessError::persist(path, e.to_string()));
        }
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}

/// Where a persisted report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReport {
    pub path: PathBuf,
    pub sheet: String,
    pub rows: usize,
}

/// Destination for the finished report table.
pub trait ReportWriter {
    /// Persist `table`. Called exactly once per run, after every outcome
    /// has been recorded.
    fn persist(&mut self, table: ReportTable) -> Result<PersistedReport, HarnessError>;
}

/// Writes the report as a new sheet of a workbook file.
#[derive(Debug, Clone)]
pub struct WorkbookWriter {
    path: PathBuf,
    sheet_name: String,
}

impl WorkbookWriter {
    /// Writer for `path`, naming the sheet after `started_at`.
    pub fn new(path: impl Into<PathBuf>, started_at: DateTime<Local>) -> Self {
        Self {
            path: path.into(),
            sheet_name: started_at.format(SHEET_NAME_FORMAT).to_string(),
        }
    }

    /// Sheet name this writer will use, before de-duplication.
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }
}

impl ReportWriter for WorkbookWriter {
    fn persist(&mut self, table: ReportTable) -> Result<PersistedReport, HarnessError> {
        let rows = table.len();
        let mut workbook = Workbook::open_or_create(&self.path);
        let sheet = workbook.add_sheet(&self.sheet_name, table);
        workbook.save(&self.path)?;

        info!(
            path = %self.path.display(),
            sheet = %sheet,
            rows = rows,
            "Report saved"
        );
        Ok(PersistedReport {
            path: self.path.clone(),
            sheet,
            rows,
        })
    }
}
