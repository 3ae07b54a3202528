//! Error types for parsing and batch processing

use std::path::{Path, PathBuf};

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::config::ConfigError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A well-formedness error the parser could not get past
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("XML error at byte {offset}: {message}")]
pub struct XmlError {
    /// Byte offset into the source where the problem was detected
    pub offset: usize,
    pub message: String,
}

impl XmlError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    /// Span covering the offending character, clamped to the source
    pub fn span(&self, source: &str) -> Span {
        let mut start = self.offset.min(source.len());
        while !source.is_char_boundary(start) {
            start -= 1;
        }
        let end = source[start..]
            .chars()
            .next()
            .map(|c| start + c.len_utf8())
            .unwrap_or(start);
        start..end
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        // ariadne counts chars, not bytes
        let span = self.span(source);
        let start = source[..span.start].chars().count();
        let end = start + source[span].chars().count();

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, start)
            .with_config(ariadne::Config::default().with_color(false))
            .with_message(&self.message)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Errors raised by the batch tools
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {source}", path.display())]
    Xml {
        path: PathBuf,
        source: XmlError,
        /// Rendered report pointing into the document text
        report: String,
    },

    /// File stem is not one of the fifty state slugs
    #[error("'{}' is not named after a recognized state (slug '{slug}')", path.display())]
    UnknownSlug { path: PathBuf, slug: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn xml(path: &Path, text: &str, source: XmlError) -> Self {
        let report = source.format(text, &path.display().to_string());
        Self::Xml {
            path: path.to_path_buf(),
            source,
            report,
        }
    }

    /// Source-context report for errors that have one
    pub fn report(&self) -> Option<&str> {
        match self {
            Self::Xml { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn unknown_slug(path: &Path, slug: impl Into<String>) -> Self {
        Self::UnknownSlug {
            path: path.to_path_buf(),
            slug: slug.into(),
        }
    }
}
