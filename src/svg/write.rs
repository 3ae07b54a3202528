//! Serialization of a [`Document`] back to text

use quick_xml::escape::escape;

use super::document::{Document, Element, Node};

/// Output options for serialized documents
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` before the document
    pub xml_declaration: bool,

    /// End the output with a newline
    pub trailing_newline: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            trailing_newline: true,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the XML declaration is emitted
    pub fn with_xml_declaration(mut self, declaration: bool) -> Self {
        self.xml_declaration = declaration;
        self
    }

    /// Set whether output ends with a newline
    pub fn with_trailing_newline(mut self, newline: bool) -> Self {
        self.trailing_newline = newline;
        self
    }
}

/// Builds the serialized form of a document incrementally
struct XmlWriter {
    out: String,
}

impl XmlWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn declaration(&mut self) {
        self.out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        self.out.push('\n');
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Element(element) => self.element(element),
            Node::Text(text) => self.out.push_str(text),
            Node::CData(data) => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(data);
                self.out.push_str("]]>");
            }
            Node::Comment(comment) => {
                self.out.push_str("<!--");
                self.out.push_str(comment);
                self.out.push_str("-->");
            }
            Node::ProcessingInstruction(pi) => {
                self.out.push_str("<?");
                self.out.push_str(pi);
                self.out.push_str("?>");
            }
            Node::DocType(doctype) => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(doctype.trim_start());
                self.out.push('>');
            }
        }
    }

    fn element(&mut self, element: &Element) {
        self.out.push('<');
        self.out.push_str(&element.name);
        for attr in &element.attributes {
            self.out.push(' ');
            self.out.push_str(&attr.name);
            self.out.push_str("=\"");
            self.out.push_str(&escape(attr.value.as_str()));
            self.out.push('"');
        }

        if element.children.is_empty() {
            self.out.push_str("/>");
            return;
        }

        self.out.push('>');
        for child in &element.children {
            self.node(child);
        }
        self.out.push_str("</");
        self.out.push_str(&element.name);
        self.out.push('>');
    }

    fn finish(self) -> String {
        self.out
    }
}

impl Document {
    /// Serialize the document
    ///
    /// Namespace declarations are ordinary attributes on the elements that
    /// carried them, so they are written back exactly where they were.
    pub fn to_xml_string(&self, options: &WriteOptions) -> String {
        let mut writer = XmlWriter::new();
        if options.xml_declaration {
            writer.declaration();
        }
        for node in &self.prolog {
            writer.node(node);
            writer.out.push('\n');
        }
        writer.element(&self.root);
        for node in &self.epilog {
            writer.out.push('\n');
            writer.node(node);
        }
        if options.trailing_newline {
            writer.out.push('\n');
        }
        writer.finish()
    }
}
