//! The report table filled by the result sink.

use serde::{Deserialize, Serialize};

use crate::TaskOutcome;

/// Header row written at the top of every report table.
pub const REPORT_HEADER: [&str; 6] = ["case", "error", "macro", "algorithm", "duration", "solution"];

/// A single report cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Append-only table: one header row, then one row per outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTable")]
pub struct ReportTable {
    rows: Vec<Vec<Cell>>,
}

/// Table as read back from storage, before the header is checked.
#[derive(Deserialize)]
struct StoredTable {
    rows: Vec<Vec<Cell>>,
}

impl TryFrom<StoredTable> for ReportTable {
    type Error = String;

    fn try_from(stored: StoredTable) -> Result<Self, Self::Error> {
        let header_ok = stored.rows.first().is_some_and(|header| {
            header.len() == REPORT_HEADER.len()
                && header
                    .iter()
                    .zip(REPORT_HEADER)
                    .all(|(cell, name)| matches!(cell, Cell::Text(text) if text == name))
        });
        if !header_ok {
            return Err("report table does not start with the report header".to_string());
        }
        Ok(Self { rows: stored.rows })
    }
}

impl ReportTable {
    /// Create a table holding only the header row.
    pub fn new() -> Self {
        Self {
            rows: vec![REPORT_HEADER.iter().map(|h| Cell::from(*h)).collect()],
        }
    }

    /// Append the row for one outcome.
    ///
    /// Duration and solution cells are only written for successful
    /// outcomes; other rows stop after the algorithm column.
    pub fn append(&mut self, outcome: &TaskOutcome) {
        let mut row = vec![
            Cell::from(outcome.item.case_name()),
            Cell::from(outcome.error_detail().unwrap_or_default()),
            Cell::from(outcome.macro_flag.as_str()),
            Cell::from(outcome.algorithm.as_str()),
        ];
        if let Some(result) = outcome.result() {
            row.push(Cell::from(result.duration));
            row.push(Cell::from(result.solution.as_str()));
        }
        self.rows.push(row);
    }

    /// The header row.
    pub fn header(&self) -> &[Cell] {
        &self.rows[0]
    }

    /// Every row after the header, in append order.
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        &self.rows[1..]
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len() - 1
    }

    /// Returns true if no data row has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReportTable {
    fn default() -> Self {
        Self::new()
    }
}
