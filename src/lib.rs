//! SVG state-map tools
//!
//! Batch utilities for maintaining a set of US state map SVGs whose
//! district shapes carry ids like `TX01`:
//!
//! - strip an embedded credit-text block ([`tools::strip`])
//! - tag district elements with their state name ([`tools::tag`])
//! - restyle strokes ([`tools::recolor`])
//! - reduce a state's map to its own districts ([`tools::filter`])
//! - make districts keyboard-focusable ([`tools::interactive`])
//!
//! # Example
//!
//! ```rust
//! use svg_statekit::svg::{parse, ParseMode, WriteOptions};
//! use svg_statekit::tools::{filter, tag};
//!
//! let mut doc = parse(
//!     r#"<svg xmlns="http://www.w3.org/2000/svg"><path id="TX01"/><path id="OK01"/></svg>"#,
//!     ParseMode::Strict,
//! ).unwrap();
//!
//! let report = tag::tag_document(&mut doc, "data-state");
//! assert_eq!(report.matched.len(), 2);
//!
//! filter::filter_document(&mut doc, "TX");
//! let svg = doc.to_xml_string(&WriteOptions::default());
//! assert!(svg.contains(r#"<path id="TX01" data-state="Texas"/>"#));
//! assert!(!svg.contains("OK01"));
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod states;
pub mod svg;
pub mod tools;

pub use batch::BatchReport;
pub use config::{Config, ConfigError, UnknownSlugPolicy};
pub use error::{Error, XmlError};
pub use svg::{parse, Document, Element, ParseMode, WriteOptions};
