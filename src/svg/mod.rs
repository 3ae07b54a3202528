//! In-memory SVG documents
//!
//! This module parses SVG text into an owned tree that the tools mutate
//! in place, and writes the tree back out.

pub mod document;
pub mod parse;
pub mod write;

pub use document::{Attribute, Document, Element, Node, Recovery};
pub use parse::{parse, ParseMode};
pub use write::WriteOptions;
