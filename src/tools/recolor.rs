//! Stroke recolorer

use std::path::Path;

use crate::batch::{self, BatchReport};
use crate::config::RecolorConfig;
use crate::error::Error;
use crate::svg::{Document, ParseMode, WriteOptions};

/// Stroke color and width applied to stroked elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrokeStyle {
    pub stroke: String,
    pub width: String,
}

impl StrokeStyle {
    pub fn new(stroke: impl Into<String>, width: impl Into<String>) -> Self {
        Self {
            stroke: stroke.into(),
            width: width.into(),
        }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        let config = RecolorConfig::default();
        Self::new(config.stroke, config.stroke_width)
    }
}

impl From<&RecolorConfig> for StrokeStyle {
    fn from(config: &RecolorConfig) -> Self {
        Self::new(&config.stroke, &config.stroke_width)
    }
}

/// Overwrite `stroke` and `stroke-width` on every element that already has
/// a `stroke` attribute. Unstroked elements are left alone. Returns the
/// number of elements changed.
pub fn recolor_document(doc: &mut Document, style: &StrokeStyle) -> usize {
    let mut count = 0;
    doc.visit_mut(&mut |element| {
        if element.has_attribute("stroke") {
            element.set_attribute("stroke", style.stroke.as_str());
            element.set_attribute("stroke-width", style.width.as_str());
            count += 1;
        }
    });
    count
}

/// Recolor one file in place
pub fn recolor_file(path: &Path, style: &StrokeStyle, mode: ParseMode) -> Result<usize, Error> {
    let mut doc = batch::load(path, mode)?;
    let count = recolor_document(&mut doc, style);
    batch::save(path, &doc, &WriteOptions::default())?;
    Ok(count)
}

/// Recolor every `.svg` file in the configured directory
pub fn recolor_dir(config: &RecolorConfig) -> Result<BatchReport, Error> {
    let style = StrokeStyle::from(config);
    let mut report = BatchReport::new();
    for path in batch::svg_files(&config.dir)? {
        let count = recolor_file(&path, &style, config.parse_mode)?;
        tracing::info!(elements = count, "Recolored {}", path.display());
        report.processed(path);
    }
    Ok(report)
}
