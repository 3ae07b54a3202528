//! State tagger
//!
//! Ids of the form `<CODE><1-2 digits><optional letters>` (`TX01`,
//! `CA12b`) name a district of a state. Every element whose id resolves to
//! a known code gets an annotation attribute holding the state's full name.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::batch;
use crate::config::TagConfig;
use crate::error::Error;
use crate::states;
use crate::svg::{Document, WriteOptions};

fn id_pattern() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"^([A-Z]{2})\d{1,2}([A-Za-z]*)$").unwrap())
}

/// How an element id relates to the state table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdClass<'a> {
    /// Id does not have the district shape
    Mismatched,
    /// District-shaped, but the code is not in the table
    Unmatched { code: &'a str },
    /// Resolved to a state or territory
    Matched {
        code: &'a str,
        state: &'static str,
        suffix: &'a str,
    },
}

pub fn classify_id(id: &str) -> IdClass<'_> {
    let Some(caps) = id_pattern().captures(id) else {
        return IdClass::Mismatched;
    };
    let code = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    match states::state_name(code) {
        Some(state) => IdClass::Matched {
            code,
            state,
            suffix,
        },
        None => IdClass::Unmatched { code },
    }
}

/// An element that received the annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedId {
    pub id: String,
    pub state: &'static str,
    pub suffix: String,
}

/// Tally of one tagging run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    pub matched: Vec<TaggedId>,
    pub mismatched: Vec<String>,
    pub unmatched: Vec<String>,
}

impl TagReport {
    /// Human-readable summary listing at most `limit` ids per failure class
    pub fn summary(&self, limit: usize) -> String {
        let mut out = String::from("--- Processing Summary ---\n");
        let _ = writeln!(out, "Total elements with matching IDs: {}", self.matched.len());
        list_ids(&mut out, "Elements with non-matching IDs", &self.mismatched, limit);
        list_ids(
            &mut out,
            "Elements with unrecognized state codes",
            &self.unmatched,
            limit,
        );
        out
    }
}

fn list_ids(out: &mut String, heading: &str, ids: &[String], limit: usize) {
    if ids.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({}):", heading, ids.len());
    for id in ids.iter().take(limit) {
        let _ = writeln!(out, "  - {}", id);
    }
    if ids.len() > limit {
        let _ = writeln!(out, "  ... and {} more", ids.len() - limit);
    }
}

/// Annotate every element whose id resolves to a state
///
/// Elements are visited in document order, root included. Unresolved ids
/// are counted and left unmodified.
pub fn tag_document(doc: &mut Document, attribute: &str) -> TagReport {
    let mut report = TagReport::default();
    doc.visit_mut(&mut |element| {
        let Some(id) = element.id().map(str::to_string) else {
            return;
        };
        match classify_id(&id) {
            IdClass::Matched { state, suffix, .. } => {
                element.set_attribute(attribute, state);
                if suffix.is_empty() {
                    tracing::debug!("Added {}='{}' to element with id='{}'", attribute, state, id);
                } else {
                    tracing::info!(
                        "Element with id='{}' has suffix='{}'. Added {}='{}'",
                        id,
                        suffix,
                        attribute,
                        state
                    );
                }
                let suffix = suffix.to_string();
                report.matched.push(TaggedId { id, state, suffix });
            }
            IdClass::Unmatched { code } => {
                tracing::warn!("State code '{}' not recognized for id='{}'", code, id);
                report.unmatched.push(id);
            }
            IdClass::Mismatched => {
                tracing::debug!("Skipping element with id='{}' (does not match pattern)", id);
                report.mismatched.push(id);
            }
        }
    });
    report
}

/// Load and tag one file without writing it
pub fn tag_input(input: &Path, config: &TagConfig) -> Result<(Document, TagReport), Error> {
    let mut doc = batch::load(input, config.parse_mode)?;
    let report = tag_document(&mut doc, &config.attribute);
    Ok((doc, report))
}

/// Write a tagged document to `output`
pub fn save_tagged(output: &Path, doc: &Document) -> Result<(), Error> {
    batch::save(output, doc, &WriteOptions::default())?;
    tracing::info!("Modified SVG has been saved to '{}'", output.display());
    Ok(())
}

/// Tag one file and write the result to `output`
pub fn tag_file(input: &Path, output: &Path, config: &TagConfig) -> Result<TagReport, Error> {
    let (doc, report) = tag_input(input, config)?;
    save_tagged(output, &doc)?;
    Ok(report)
}
