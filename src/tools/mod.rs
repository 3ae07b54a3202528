//! The batch tools
//!
//! - [`strip`]: remove the embedded credit text (raw text, in place)
//! - [`tag`]: annotate district elements with their state name
//! - [`recolor`]: restyle stroked elements (in place)
//! - [`filter`]: keep only a state's own district paths (to a new directory)
//! - [`interactive`]: add accessibility attributes to district elements

pub mod filter;
pub mod interactive;
pub mod recolor;
pub mod strip;
pub mod tag;

use std::path::Path;

use crate::batch::{self, BatchReport};
use crate::config::UnknownSlugPolicy;
use crate::error::Error;
use crate::states;

/// The state code implied by a file's name, e.g. `TX` for `texas.svg`
pub fn state_code_for(path: &Path) -> Result<&'static str, Error> {
    let slug = batch::file_slug(path).unwrap_or_default();
    states::slug_code(slug).ok_or_else(|| Error::unknown_slug(path, slug))
}

/// Apply the unknown-slug policy to a failed lookup
fn unknown_slug(
    err: Error,
    path: &Path,
    policy: UnknownSlugPolicy,
    report: &mut BatchReport,
) -> Result<(), Error> {
    match policy {
        UnknownSlugPolicy::Abort => Err(err),
        UnknownSlugPolicy::Skip => {
            tracing::warn!("Skipping {}: {}", path.display(), err);
            report.skipped(path, err.to_string());
            Ok(())
        }
    }
}
