//! XML parsing into an owned [`Document`]
//!
//! Built on the quick-xml pull reader. End-tag matching and namespace
//! resolution are done here rather than by the reader so that the lenient
//! mode can repair what the strict mode rejects.

use std::borrow::Cow;

use clap::ValueEnum;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;

use super::document::{split_qname, Attribute, Document, Element, Node, Recovery};
use crate::error::XmlError;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// How to treat input that is not well-formed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Reject any well-formedness violation
    #[default]
    Strict,
    /// Repair mismatched or missing end tags, dangling `&`, malformed
    /// attribute lists and stray top-level text, noting each repair
    Lenient,
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseMode::Strict => write!(f, "strict"),
            ParseMode::Lenient => write!(f, "lenient"),
        }
    }
}

/// Parse SVG/XML text into a document
///
/// # Example
///
/// ```rust
/// use svg_statekit::svg::{parse, ParseMode};
///
/// let doc = parse(r#"<svg xmlns="http://www.w3.org/2000/svg"><path id="TX01"/></svg>"#, ParseMode::Strict).unwrap();
/// assert_eq!(doc.root.local_name(), "svg");
/// assert_eq!(doc.default_namespace(), Some("http://www.w3.org/2000/svg"));
/// ```
pub fn parse(source: &str, mode: ParseMode) -> Result<Document, XmlError> {
    let (body, base) = match source.strip_prefix('\u{feff}') {
        Some(rest) => (rest, source.len() - rest.len()),
        None => (source, 0),
    };
    TreeBuilder::new(mode, base).build(body)
}

/// An element still waiting for its end tag
struct OpenElement {
    element: Element,
    /// Namespace bindings declared on this element
    bindings: Vec<(Option<String>, String)>,
    offset: usize,
}

struct TreeBuilder {
    mode: ParseMode,
    base: usize,
    stack: Vec<OpenElement>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    recoveries: Vec<Recovery>,
}

impl TreeBuilder {
    fn new(mode: ParseMode, base: usize) -> Self {
        Self {
            mode,
            base,
            stack: Vec::new(),
            prolog: Vec::new(),
            root: None,
            epilog: Vec::new(),
            recoveries: Vec::new(),
        }
    }

    fn lenient(&self) -> bool {
        self.mode == ParseMode::Lenient
    }

    fn build(mut self, source: &str) -> Result<Document, XmlError> {
        let mut reader = Reader::from_str(source);
        {
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
            config.expand_empty_elements = false;
            config.check_comments = !self.lenient();
            config.allow_dangling_amp = self.lenient();
        }

        loop {
            let offset = self.base + reader.buffer_position() as usize;
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    let at = self.base + reader.error_position() as usize;
                    return Err(XmlError::new(at, err.to_string()));
                }
            };

            match event {
                Event::Start(start) => {
                    let open = self.open(&start, offset)?;
                    self.stack.push(open);
                }
                Event::Empty(start) => {
                    let open = self.open(&start, offset)?;
                    self.attach(Node::Element(open.element), offset)?;
                }
                Event::End(end) => {
                    let name = bytes_to_string(end.name().as_ref());
                    self.close(&name, offset)?;
                }
                Event::Text(text) => {
                    let text = self.escape_dangling_amp(bytes_to_string(&text), offset)?;
                    self.attach_text(&text, offset)?;
                }
                Event::GeneralRef(reference) => {
                    let entity = format!("&{};", bytes_to_string(&reference));
                    self.attach_text(&entity, offset)?;
                }
                Event::CData(data) => {
                    self.attach(Node::CData(bytes_to_string(&data)), offset)?;
                }
                Event::Comment(comment) => {
                    let comment = self.repair_comment(bytes_to_string(&comment), offset)?;
                    self.attach(Node::Comment(comment), offset)?;
                }
                Event::PI(pi) => {
                    self.attach(Node::ProcessingInstruction(bytes_to_string(&pi)), offset)?;
                }
                Event::DocType(doctype) => {
                    self.attach(Node::DocType(bytes_to_string(&doctype)), offset)?;
                }
                // The writer emits its own declaration
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        let end = self.base + source.len();
        self.finish(end)
    }

    /// Turn a start tag into an element, resolving its namespace
    fn open(&mut self, start: &BytesStart<'_>, offset: usize) -> Result<OpenElement, XmlError> {
        let name = bytes_to_string(start.name().as_ref());
        let mut element = Element::new(name);
        let mut bindings = Vec::new();

        let mut attributes = start.attributes();
        attributes.with_checks(!self.lenient());
        for attr in attributes {
            let attr = match attr {
                Ok(attr) => attr,
                Err(err) => {
                    let message = format!("malformed attribute on <{}>: {}", element.name, err);
                    self.recover(offset, message)?;
                    break;
                }
            };
            let key = bytes_to_string(attr.key.as_ref());
            let raw = bytes_to_string(&attr.value);
            let value = match quick_xml::escape::unescape(&raw) {
                Ok(value) => value.into_owned(),
                Err(err) => {
                    let message = format!(
                        "bad escape in attribute '{}': {}; '&' kept as literal text",
                        key, err
                    );
                    self.recover(offset, message)?;
                    raw
                }
            };

            if key == "xmlns" {
                bindings.push((None, value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                bindings.push((Some(prefix.to_string()), value.clone()));
            }
            if element.has_attribute(&key) {
                self.recover(offset, format!("duplicate attribute '{}'", key))?;
                continue;
            }
            element.attributes.push(Attribute { name: key, value });
        }

        let prefix = split_qname(&element.name).0.map(str::to_string);
        element.namespace = match self.resolve(prefix.as_deref(), &bindings) {
            Some(uri) => Some(uri),
            None if prefix.is_some() => {
                let message = format!("namespace prefix on <{}> is not bound", element.name);
                self.recover(offset, message)?;
                None
            }
            None => None,
        };

        Ok(OpenElement {
            element,
            bindings,
            offset,
        })
    }

    /// Look a prefix up, innermost binding first. An empty default
    /// namespace declaration unbinds the default.
    fn resolve(&self, prefix: Option<&str>, own: &[(Option<String>, String)]) -> Option<String> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE.to_string());
        }
        let scopes = std::iter::once(own).chain(self.stack.iter().rev().map(|o| &o.bindings[..]));
        for bindings in scopes {
            if let Some((_, uri)) = bindings.iter().find(|(p, _)| p.as_deref() == prefix) {
                return (!uri.is_empty()).then(|| uri.clone());
            }
        }
        None
    }

    fn close(&mut self, name: &str, offset: usize) -> Result<(), XmlError> {
        let Some(position) = self.stack.iter().rposition(|o| o.element.name == name) else {
            return self.recover(offset, format!("unexpected end tag </{}>", name));
        };

        while self.stack.len() > position + 1 {
            let unclosed = self.stack.len() - 1;
            let expected = self.stack[unclosed].element.name.clone();
            self.recover(
                offset,
                format!("expected </{}>, found </{}>", expected, name),
            )?;
            self.pop(offset)?;
        }
        self.pop(offset)
    }

    fn pop(&mut self, offset: usize) -> Result<(), XmlError> {
        match self.stack.pop() {
            Some(open) => self.attach(Node::Element(open.element), offset),
            None => Ok(()),
        }
    }

    /// References arrive as separate events, so any `&` left in a text
    /// event is a bare ampersand the lenient reader let through
    fn escape_dangling_amp(&mut self, text: String, offset: usize) -> Result<String, XmlError> {
        if !text.contains('&') {
            return Ok(text);
        }
        self.recover(offset, "bare '&' in text escaped as '&amp;'")?;
        Ok(text.replace('&', "&amp;"))
    }

    /// Split `--` runs and a trailing `-`, which a comment may not contain
    fn repair_comment(&mut self, comment: String, offset: usize) -> Result<String, XmlError> {
        if !comment.contains("--") && !comment.ends_with('-') {
            return Ok(comment);
        }
        self.recover(offset, "'--' in comment split into '- -'")?;
        let mut repaired = comment;
        while repaired.contains("--") {
            repaired = repaired.replace("--", "- -");
        }
        if repaired.ends_with('-') {
            repaired.push(' ');
        }
        Ok(repaired)
    }

    fn attach_text(&mut self, text: &str, offset: usize) -> Result<(), XmlError> {
        if let Some(open) = self.stack.last_mut() {
            match open.element.children.last_mut() {
                Some(Node::Text(existing)) => existing.push_str(text),
                _ => open.element.children.push(Node::Text(text.to_string())),
            }
            return Ok(());
        }
        if text.trim().is_empty() {
            return Ok(());
        }
        self.recover(offset, "text outside the root element")
    }

    /// Attach a finished node to the open element, or place it around the root
    fn attach(&mut self, node: Node, offset: usize) -> Result<(), XmlError> {
        if let Some(open) = self.stack.last_mut() {
            open.element.children.push(node);
            return Ok(());
        }
        match node {
            Node::Element(element) if self.root.is_none() => {
                self.root = Some(element);
                Ok(())
            }
            Node::Element(element) => {
                self.recover(offset, format!("extra root element <{}> dropped", element.name))
            }
            other if self.root.is_none() => {
                self.prolog.push(other);
                Ok(())
            }
            other => {
                self.epilog.push(other);
                Ok(())
            }
        }
    }

    fn finish(mut self, end: usize) -> Result<Document, XmlError> {
        while let Some(open) = self.stack.last() {
            let message = format!("unclosed element <{}>", open.element.name);
            let offset = open.offset;
            self.recover(offset, message)?;
            self.pop(end)?;
        }

        let root = self
            .root
            .ok_or_else(|| XmlError::new(end, "no root element"))?;

        Ok(Document {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
            recoveries: self.recoveries,
        })
    }

    /// Record a repair in lenient mode; fail in strict mode
    fn recover(&mut self, offset: usize, message: impl Into<String>) -> Result<(), XmlError> {
        let message = message.into();
        if !self.lenient() {
            return Err(XmlError::new(offset, message));
        }
        self.recoveries.push(Recovery { offset, message });
        Ok(())
    }
}

fn bytes_to_string(bytes: &[u8]) -> String {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::WriteOptions;

    const SVG_NS: &str = "http://www.w3.org/2000/svg";

    #[test]
    fn test_parse_simple_document() {
        let doc = parse(
            r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"><g id="layer"><path id="TX01" d="M0 0"/></g></svg>"#,
            ParseMode::Strict,
        )
        .unwrap();
        assert_eq!(doc.root.name, "svg");
        assert_eq!(doc.root.namespace.as_deref(), Some(SVG_NS));
        let path = doc.elements().find(|e| e.local_name() == "path").unwrap();
        assert_eq!(path.id(), Some("TX01"));
        assert_eq!(path.namespace.as_deref(), Some(SVG_NS));
        assert!(!doc.was_recovered());
    }

    #[test]
    fn test_prefixed_namespace_resolution() {
        let doc = parse(
            r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:path id="a"/><path id="b"/></svg:svg>"#,
            ParseMode::Strict,
        )
        .unwrap();
        let paths: Vec<_> = doc.elements().filter(|e| e.local_name() == "path").collect();
        assert_eq!(paths[0].namespace.as_deref(), Some(SVG_NS));
        assert_eq!(paths[1].namespace, None);
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let doc = parse(r#"<svg title="a &amp; b &lt;c&gt;"/>"#, ParseMode::Strict).unwrap();
        assert_eq!(doc.root.attribute("title"), Some("a & b <c>"));
    }

    #[test]
    fn test_text_keeps_entities_escaped() {
        let doc = parse("<svg><text>a &amp; b</text></svg>", ParseMode::Strict).unwrap();
        let text = doc.root.child_elements().next().unwrap();
        assert_eq!(text.children, vec![Node::Text("a &amp; b".to_string())]);
    }

    #[test]
    fn test_prolog_and_epilog_are_kept() {
        let doc = parse(
            "<!-- made by hand -->\n<svg/>\n<!-- trailer -->",
            ParseMode::Strict,
        )
        .unwrap();
        assert_eq!(doc.prolog, vec![Node::Comment(" made by hand ".to_string())]);
        assert_eq!(doc.epilog, vec![Node::Comment(" trailer ".to_string())]);
    }

    #[test]
    fn test_strict_rejects_mismatched_end_tag() {
        let err = parse("<svg><g></svg>", ParseMode::Strict).unwrap_err();
        assert!(err.message.contains("expected </g>"), "{}", err.message);
    }

    #[test]
    fn test_strict_rejects_unclosed_root() {
        let err = parse("<svg><g/>", ParseMode::Strict).unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("unclosed element <svg>"));
    }

    #[test]
    fn test_strict_rejects_stray_end_tag() {
        let err = parse("<svg></g></svg>", ParseMode::Strict).unwrap_err();
        assert!(err.message.contains("unexpected end tag </g>"));
    }

    #[test]
    fn test_lenient_repairs_mismatched_end_tag() {
        let doc = parse("<svg><g><path id=\"TX01\"/></svg>", ParseMode::Lenient).unwrap();
        assert!(doc.was_recovered());
        let ids: Vec<_> = doc.elements().filter_map(|e| e.id()).collect();
        assert_eq!(ids, ["TX01"]);
        assert_eq!(doc.root.child_elements().next().unwrap().name, "g");
    }

    #[test]
    fn test_lenient_closes_elements_at_eof() {
        let doc = parse("<svg><g>", ParseMode::Lenient).unwrap();
        assert_eq!(doc.recoveries.len(), 2);
        assert_eq!(doc.root.child_elements().count(), 1);
    }

    #[test]
    fn test_lenient_ignores_stray_end_tag() {
        let doc = parse("<svg></g><path/></svg>", ParseMode::Lenient).unwrap();
        assert_eq!(doc.recoveries.len(), 1);
        assert_eq!(doc.root.child_elements().count(), 1);
    }

    fn reparse_strict(doc: &Document) -> Document {
        let out = doc.to_xml_string(&WriteOptions::new().with_xml_declaration(false));
        parse(&out, ParseMode::Strict).unwrap_or_else(|e| panic!("{e}\n{out}"))
    }

    #[test]
    fn test_lenient_escapes_bare_ampersand() {
        let doc = parse(r#"<svg><text id="TX01">AT&T</text></svg>"#, ParseMode::Lenient).unwrap();
        assert_eq!(doc.recoveries.len(), 1);
        assert!(doc.recoveries[0].message.contains("'&'"));

        let again = reparse_strict(&doc);
        let text = again.root.child_elements().next().unwrap();
        assert_eq!(text.children, vec![Node::Text("AT&amp;T".to_string())]);
    }

    #[test]
    fn test_lenient_keeps_references_next_to_bare_ampersand() {
        let doc = parse("<svg><text>a &amp; b & c</text></svg>", ParseMode::Lenient).unwrap();
        assert_eq!(doc.recoveries.len(), 1);
        let again = reparse_strict(&doc);
        let text = again.root.child_elements().next().unwrap();
        assert_eq!(text.children, vec![Node::Text("a &amp; b &amp; c".to_string())]);
    }

    #[test]
    fn test_strict_rejects_bare_ampersand() {
        assert!(parse("<svg><text>AT&T</text></svg>", ParseMode::Strict).is_err());
    }

    #[test]
    fn test_lenient_repairs_double_dash_comment() {
        let doc = parse("<svg><!-- a -- b --></svg>", ParseMode::Lenient).unwrap();
        assert_eq!(doc.recoveries.len(), 1);
        assert_eq!(doc.root.children, vec![Node::Comment(" a - - b ".to_string())]);
        reparse_strict(&doc);
    }

    #[test]
    fn test_lenient_repairs_dash_runs_in_comment() {
        let doc = parse("<svg><!-- a --- b --></svg>", ParseMode::Lenient).unwrap();
        assert_eq!(doc.recoveries.len(), 1);
        assert_eq!(doc.root.children, vec![Node::Comment(" a - - - b ".to_string())]);
        reparse_strict(&doc);
    }

    #[test]
    fn test_strict_rejects_double_dash_comment() {
        assert!(parse("<svg><!-- a -- b --></svg>", ParseMode::Strict).is_err());
    }

    #[test]
    fn test_lenient_bad_attribute_escape_is_reported_as_literal() {
        let doc = parse(r#"<svg title="&nbsp;x"/>"#, ParseMode::Lenient).unwrap();
        assert_eq!(doc.recoveries.len(), 1);
        let message = &doc.recoveries[0].message;
        assert!(message.contains("attribute 'title'"), "{message}");
        assert!(message.contains("kept as literal text"), "{message}");
        assert_eq!(doc.root.attribute("title"), Some("&nbsp;x"));

        let again = reparse_strict(&doc);
        assert_eq!(again.root.attribute("title"), Some("&nbsp;x"));
    }

    #[test]
    fn test_no_root_is_unrecoverable() {
        assert!(parse("", ParseMode::Lenient).is_err());
        assert!(parse("<!-- nothing -->", ParseMode::Lenient).is_err());
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let doc = parse("\u{feff}<svg/>", ParseMode::Strict).unwrap();
        assert_eq!(doc.root.name, "svg");
    }

    #[test]
    fn test_parse_mode_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: ParseMode,
        }
        let w: Wrapper = toml::from_str(r#"mode = "lenient""#).unwrap();
        assert_eq!(w.mode, ParseMode::Lenient);
    }
}
