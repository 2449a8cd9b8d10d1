//! Work items and their enumeration from an input directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// One input case, identified by its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkItem(PathBuf);

impl WorkItem {
    /// Create a WorkItem from an already-resolved path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Get the inner path reference.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Consume and return the inner path.
    pub fn into_inner(self) -> PathBuf {
        self.0
    }

    /// Case identifier used in the report: the path's base name.
    pub fn case_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for WorkItem {
    fn from(p: PathBuf) -> Self {
        Self(p)
    }
}

impl From<&str> for WorkItem {
    fn from(s: &str) -> Self {
        Self(PathBuf::from(s))
    }
}

/// List every non-directory entry of `folder` as an absolute-path WorkItem.
///
/// Items are returned sorted by path. Subdirectories are skipped, not
/// descended into. Any listing or path-resolution failure is fatal.
pub fn enumerate_work_items(folder: impl AsRef<Path>) -> Result<Vec<WorkItem>, HarnessError> {
    let folder = folder.as_ref();
    let entries = fs::read_dir(folder).map_err(|e| HarnessError::enumeration(folder, e))?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::enumeration(folder, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| HarnessError::enumeration(entry.path(), e))?;
        if file_type.is_dir() {
            continue;
        }
        let path = entry.path();
        let absolute = std::path::absolute(&path).map_err(|e| HarnessError::enumeration(&path, e))?;
        items.push(WorkItem::new(absolute));
    }

    items.sort();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_name_is_base_name() {
        let item = WorkItem::new("/data/warehouses/warehouse_07.txt");
        assert_eq!(item.case_name(), "warehouse_07.txt");
    }

    #[test]
    fn test_enumerate_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "c").unwrap();

        let items = enumerate_work_items(dir.path()).unwrap();
        let names: Vec<String> = items.iter().map(WorkItem::case_name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(items.iter().all(|item| item.path().is_absolute()));
    }

    #[test]
    fn test_enumerate_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let items = enumerate_work_items(dir.path()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_enumerate_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = enumerate_work_items(&missing).unwrap_err();
        match err {
            HarnessError::Enumeration { path, .. } => assert_eq!(path, missing),
            other => panic!("Expected Enumeration error, got {other:?}"),
        }
    }
}
