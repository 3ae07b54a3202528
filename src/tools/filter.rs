//! State-path filter
//!
//! Each input file is named after one state (`texas.svg`). Every `<path>`
//! whose id does not begin with that state's code is removed, leaving only
//! the state's own districts. Results go to a separate directory.

use std::path::Path;

use crate::batch::{self, BatchReport};
use crate::config::FilterConfig;
use crate::error::Error;
use crate::svg::{Document, ParseMode, WriteOptions};

use super::{state_code_for, unknown_slug};

/// Paths kept and removed in one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub kept: usize,
    pub removed: usize,
}

/// Remove every path element whose id does not start with `prefix`
///
/// Paths are matched in the root's default namespace (or no namespace when
/// none is declared). A path without an id never matches. The comparison
/// is an exact, case-sensitive prefix test.
pub fn filter_document(doc: &mut Document, prefix: &str) -> FilterOutcome {
    let namespace = doc.default_namespace().map(str::to_string);
    let namespace = namespace.as_deref();

    let removed = doc.root.retain_descendants(&mut |element| {
        !element.is(namespace, "path") || element.id().unwrap_or_default().starts_with(prefix)
    });
    let kept = doc
        .root
        .descendants()
        .skip(1)
        .filter(|e| e.is(namespace, "path"))
        .count();

    FilterOutcome { kept, removed }
}

/// Filter one file into `output_dir`, keeping its file name
pub fn filter_file(input: &Path, output_dir: &Path, mode: ParseMode) -> Result<FilterOutcome, Error> {
    let code = state_code_for(input)?;
    let mut doc = batch::load(input, mode)?;
    let outcome = filter_document(&mut doc, code);

    let file_name = input.file_name().unwrap_or(input.as_os_str());
    batch::save(&output_dir.join(file_name), &doc, &WriteOptions::default())?;
    Ok(outcome)
}

/// Filter every `.svg` file of the input directory into the output directory
pub fn filter_dir(config: &FilterConfig) -> Result<BatchReport, Error> {
    let mut report = BatchReport::new();
    for path in batch::svg_files(&config.input_dir)? {
        match filter_file(&path, &config.output_dir, config.parse_mode) {
            Ok(outcome) => {
                tracing::info!(
                    kept = outcome.kept,
                    removed = outcome.removed,
                    "Filtered {}",
                    path.display()
                );
                report.processed(path);
            }
            Err(err @ Error::UnknownSlug { .. }) => {
                unknown_slug(err, &path, config.on_unknown_slug, &mut report)?;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(report)
}
