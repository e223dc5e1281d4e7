//! Local component sources.
//!
//! A [`ComponentSource`] turns a root directory into raw definition records.
//! It does no interpretation beyond parsing JSON: identity, typing and
//! hashing happen in the local builder.

use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::{DirEntry, WalkDir};

use crate::error::BuilderError;

/// One parsed definition file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Path relative to the scanned root.
    pub path: PathBuf,
    pub definition: Value,
}

/// A file that was found but could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceScan {
    pub records: Vec<SourceRecord>,
    pub failures: Vec<SourceFailure>,
}

pub trait ComponentSource {
    /// Reads every definition under `root`.
    ///
    /// Only an unreadable root is an error; individual bad files are
    /// reported in [`SourceScan::failures`].
    fn scan(&self, root: &Path) -> Result<SourceScan, BuilderError>;
}

/// Walks a directory tree for `*.json` files.
///
/// Entries are visited in file-name order so repeated scans of the same
/// tree produce the same record order. Hidden directories are pruned
/// unless `include_hidden` is set.
#[derive(Debug, Clone, Default)]
pub struct FsComponentSource {
    pub include_hidden: bool,
}

impl FsComponentSource {
    pub fn new(include_hidden: bool) -> Self {
        FsComponentSource { include_hidden }
    }
}

impl ComponentSource for FsComponentSource {
    /// Symbolic links are not followed, so a link cycle cannot make the
    /// walk revisit a directory.
    fn scan(&self, root: &Path) -> Result<SourceScan, BuilderError> {
        let include_hidden = self.include_hidden;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden_dir(e));

        let mut scan = SourceScan::default();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(BuilderError::io(root, err.into())),
                Err(err) => {
                    let path = err.path().map(|p| relative(root, p)).unwrap_or_default();
                    let reason = err.to_string();
                    tracing::warn!(path = %path.display(), %reason, "skipping unreadable entry");
                    scan.failures.push(SourceFailure { path, reason });
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_json_file(entry.path()) {
                continue;
            }

            let path = relative(root, entry.path());
            match read_definition(entry.path()) {
                Ok(definition) => scan.records.push(SourceRecord { path, definition }),
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %reason, "skipping definition file");
                    scan.failures.push(SourceFailure { path, reason });
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            records = scan.records.len(),
            failures = scan.failures.len(),
            "scanned local components"
        );
        Ok(scan)
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with('.'))
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn read_definition(path: &Path) -> Result<Value, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    match serde_json::from_str(&content) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("definition is not a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_extension_is_case_insensitive() {
        assert!(is_json_file(Path::new("Tasks/a.JSON")));
        assert!(is_json_file(Path::new("a.json")));
        assert!(!is_json_file(Path::new("a.json.bak")));
        assert!(!is_json_file(Path::new("README")));
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let err = FsComponentSource::default()
            .scan(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, BuilderError::Io { .. }));
    }
}
