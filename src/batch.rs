//! File-level plumbing shared by the batch tools
//!
//! Each tool handles one file at a time to completion: read, transform,
//! write. Writes go to a sibling temporary file that is renamed over the
//! target, so an interrupted run never leaves a truncated SVG behind.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::svg::{parse, Document, ParseMode, WriteOptions};

/// List the `.svg` files directly inside `dir`, sorted by name
///
/// The extension check is case-insensitive. Subdirectories are not
/// descended into.
pub fn svg_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(dir).map_err(|e| Error::read(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::read(dir, e))?.path();
        if path.is_file() && is_svg(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// The file name without its extension, e.g. `texas` for `states/texas.svg`
pub fn file_slug(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

pub fn read_text(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

/// Replace `path` with `contents` via a temporary sibling and a rename
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }

    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    if let Err(e) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::write(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::write(path, e));
    }
    Ok(())
}

/// Read and parse one document
///
/// Repairs made by a lenient parse are logged as warnings.
pub fn load(path: &Path, mode: ParseMode) -> Result<Document, Error> {
    let text = read_text(path)?;
    let doc = parse(&text, mode).map_err(|e| Error::xml(path, &text, e))?;
    for recovery in &doc.recoveries {
        tracing::warn!(
            file = %path.display(),
            offset = recovery.offset,
            "recovered: {}",
            recovery.message
        );
    }
    Ok(doc)
}

/// Serialize and write one document
pub fn save(path: &Path, doc: &Document, options: &WriteOptions) -> Result<(), Error> {
    write_atomic(path, &doc.to_xml_string(options))
}

/// Outcome of a directory run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Files written, in processing order
    pub processed: Vec<PathBuf>,
    /// Files passed over, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&mut self, path: impl Into<PathBuf>) {
        self.processed.push(path.into());
    }

    pub fn skipped(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.skipped.push((path.into(), reason.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("texas.svg"), "<svg/>").unwrap();
        fs::write(dir.path().join("Alaska.SVG"), "<svg/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested.svg")).unwrap();

        let files = svg_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["Alaska.SVG", "texas.svg"]);
    }

    #[test]
    fn test_svg_files_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = svg_files(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn test_file_slug() {
        assert_eq!(file_slug(Path::new("states/north-carolina.svg")), Some("north-carolina"));
        assert_eq!(file_slug(Path::new("texas")), Some("texas"));
    }

    #[test]
    fn test_write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out").join("texas.svg");
        write_atomic(&target, "<svg/>").unwrap();
        write_atomic(&target, "<svg id=\"x\"/>").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "<svg id=\"x\"/>");
        let entries: Vec<_> = fs::read_dir(target.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_atomic_failed_temp_write_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("texas.svg");
        fs::write(&target, "<svg/>").unwrap();
        fs::create_dir(dir.path().join("texas.svg.tmp")).unwrap();

        let err = write_atomic(&target, "<svg id=\"x\"/>").unwrap_err();
        assert!(matches!(err, Error::Write { ref path, .. } if path.ends_with("texas.svg.tmp")));
        assert_eq!(fs::read_to_string(&target).unwrap(), "<svg/>");
    }

    #[test]
    fn test_write_atomic_failed_rename_removes_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("texas.svg");
        fs::create_dir(&target).unwrap();

        let err = write_atomic(&target, "<svg/>").unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert!(!dir.path().join("texas.svg.tmp").exists());
    }

    #[test]
    fn test_load_reports_parse_errors_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.svg");
        fs::write(&path, "<svg><g></svg>").unwrap();

        let err = load(&path, ParseMode::Strict).unwrap_err();
        assert!(matches!(err, Error::Xml { .. }));
        assert!(err.report().unwrap().contains("broken.svg"));
    }

    #[test]
    fn test_load_lenient_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.svg");
        fs::write(&path, "<svg><g></svg>").unwrap();

        let doc = load(&path, ParseMode::Lenient).unwrap();
        assert!(doc.was_recovered());
    }
}
