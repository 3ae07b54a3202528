//! Credit-text stripper
//!
//! Works on raw text rather than a parsed tree, so it also cleans files a
//! strict XML parser would refuse.

use std::borrow::Cow;
use std::path::Path;

use regex::Regex;

use crate::batch::{self, BatchReport};
use crate::config::StripConfig;
use crate::error::Error;

/// Removes `<text id="MARKER" ...>...</text>` blocks and the whitespace
/// left before `</svg>`
#[derive(Debug, Clone)]
pub struct CreditStripper {
    marker: Regex,
    trailing_space: Regex,
}

/// Result of stripping one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped<'a> {
    pub text: Cow<'a, str>,
    /// Number of marker blocks removed
    pub removed: usize,
}

impl<'a> Stripped<'a> {
    /// Whether the text differs from the input
    pub fn changed(&self) -> bool {
        matches!(self.text, Cow::Owned(_))
    }
}

impl CreditStripper {
    pub fn new(marker_id: &str) -> Result<Self, Error> {
        let pattern = format!(
            r#"(?is)<text\s+id="{}"[^>]*>.*?</text>"#,
            regex::escape(marker_id)
        );
        Ok(Self {
            marker: Regex::new(&pattern)?,
            trailing_space: Regex::new(r"\s+</svg>")?,
        })
    }

    /// Strip marker blocks from document text
    ///
    /// Running it again on its own output changes nothing.
    pub fn strip<'a>(&self, text: &'a str) -> Stripped<'a> {
        let removed = self.marker.find_iter(text).count();
        let text = match self.marker.replace_all(text, "") {
            Cow::Borrowed(unchanged) => self.trailing_space.replace_all(unchanged, "</svg>"),
            Cow::Owned(stripped) => {
                Cow::Owned(self.trailing_space.replace_all(&stripped, "</svg>").into_owned())
            }
        };
        Stripped { text, removed }
    }
}

/// Strip one file in place. Returns the number of marker blocks removed.
pub fn strip_file(path: &Path, stripper: &CreditStripper) -> Result<usize, Error> {
    let text = batch::read_text(path)?;
    let stripped = stripper.strip(&text);
    if stripped.changed() {
        batch::write_atomic(path, &stripped.text)?;
    }
    Ok(stripped.removed)
}

/// Strip every `.svg` file in the configured directory
pub fn strip_dir(config: &StripConfig) -> Result<BatchReport, Error> {
    let stripper = CreditStripper::new(&config.marker_id)?;
    let mut report = BatchReport::new();
    for path in batch::svg_files(&config.dir)? {
        let removed = strip_file(&path, &stripper)?;
        tracing::info!(removed, "Processed {}", display_name(&path));
        report.processed(path);
    }
    Ok(report)
}

fn display_name(path: &Path) -> Cow<'_, str> {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stripper() -> CreditStripper {
        CreditStripper::new("credit-text-svg").unwrap()
    }

    #[test]
    fn test_removes_marker_and_trailing_space() {
        let input = "<svg>\n  <path id=\"TX01\"/>\n  <text id=\"credit-text-svg\" x=\"5\">Map by\n someone</text>\n</svg>\n";
        let out = stripper().strip(input);
        assert_eq!(out.removed, 1);
        assert_eq!(out.text, "<svg>\n  <path id=\"TX01\"/></svg>\n");
    }

    #[test]
    fn test_case_insensitive_tag() {
        let out = stripper().strip("<svg><TEXT id=\"credit-text-svg\">x</Text></svg>");
        assert_eq!(out.text, "<svg></svg>");
    }

    #[test]
    fn test_non_greedy_between_blocks() {
        let input = "<svg><text id=\"credit-text-svg\">a</text><text id=\"keep\">b</text></svg>";
        let out = stripper().strip(input);
        assert_eq!(out.text, "<svg><text id=\"keep\">b</text></svg>");
    }

    #[test]
    fn test_other_text_untouched() {
        let input = "<svg><text id=\"label\">Texas</text></svg>";
        let out = stripper().strip(input);
        assert_eq!(out.removed, 0);
        assert!(!out.changed());
        assert_eq!(out.text, input);
    }

    #[test]
    fn test_idempotent() {
        let input = "<svg>\n<text id=\"credit-text-svg\">c</text>\n  </svg>";
        let s = stripper();
        let once = s.strip(input).text.into_owned();
        let twice = s.strip(&once);
        assert!(!twice.changed());
        assert_eq!(twice.text, once);
    }

    #[test]
    fn test_marker_is_matched_literally() {
        let s = CreditStripper::new("a.b").unwrap();
        let out = s.strip("<svg><text id=\"axb\">x</text></svg>");
        assert_eq!(out.removed, 0);
    }

    #[test]
    fn test_tolerates_malformed_documents() {
        let input = "<svg><g><text id=\"credit-text-svg\">c</text>  </svg>";
        let out = stripper().strip(input);
        assert_eq!(out.text, "<svg><g></svg>");
    }
}
