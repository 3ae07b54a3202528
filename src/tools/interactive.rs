//! Accessibility annotator
//!
//! Makes a state's district shapes focusable for the interactive map:
//! every element below the root whose id starts with the state's code gets
//! `tabindex="0"`, `role="button"` and `aria-label="District <id>"`.

use std::path::Path;

use crate::batch::{self, BatchReport};
use crate::config::InteractiveConfig;
use crate::error::Error;
use crate::svg::{Document, Node, ParseMode, WriteOptions};

use super::{state_code_for, unknown_slug};

/// Annotate the districts of `code`. Returns the number of elements changed.
pub fn annotate_document(doc: &mut Document, code: &str) -> usize {
    let mut count = 0;
    for child in &mut doc.root.children {
        let Node::Element(element) = child else {
            continue;
        };
        element.visit_mut(&mut |e| {
            let Some(id) = e.id().filter(|id| id.starts_with(code)) else {
                return;
            };
            let label = format!("District {}", id);
            e.set_attribute("tabindex", "0");
            e.set_attribute("role", "button");
            e.set_attribute("aria-label", label);
            count += 1;
        });
    }
    count
}

/// Annotate one file in place, using the state implied by its name
pub fn annotate_file(path: &Path, mode: ParseMode) -> Result<usize, Error> {
    let code = state_code_for(path)?;
    let mut doc = batch::load(path, mode)?;
    let count = annotate_document(&mut doc, code);
    batch::save(path, &doc, &WriteOptions::default())?;
    Ok(count)
}

/// Annotate every `.svg` file in the configured directory
pub fn annotate_dir(config: &InteractiveConfig) -> Result<BatchReport, Error> {
    let mut report = BatchReport::new();
    for path in batch::svg_files(&config.dir)? {
        match annotate_file(&path, config.parse_mode) {
            Ok(count) => {
                tracing::info!(elements = count, "Annotated {}", path.display());
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
