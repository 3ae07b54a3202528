//! Owned, mutable XML tree
//!
//! Text is kept in its escaped source form so documents round-trip without
//! re-encoding character data the tools never touch. Attribute values are
//! stored unescaped and escaped again on output.

/// A parsed SVG document: the root element plus whatever surrounds it
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Comments, processing instructions and doctype before the root
    /// (the XML declaration itself is not kept)
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Comments and processing instructions after the root
    pub epilog: Vec<Node>,
    /// Repairs made by a lenient parse, in source order
    pub recoveries: Vec<Recovery>,
}

/// A well-formedness problem the lenient parser repaired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Escaped character data, as it appeared in the source
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as written, e.g. `path` or `svg:path`
    pub name: String,
    /// Namespace URI the name resolved to at parse time
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Unescaped value
    pub value: String,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
            recoveries: Vec::new(),
        }
    }

    /// The default namespace declared on the root element, if any
    pub fn default_namespace(&self) -> Option<&str> {
        self.root.attribute("xmlns").filter(|ns| !ns.is_empty())
    }

    /// Whether the parse needed any repairs
    pub fn was_recovered(&self) -> bool {
        !self.recoveries.is_empty()
    }

    /// Visit every element, root first, in document order
    pub fn visit_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        self.root.visit_mut(f);
    }

    /// Iterate every element, root first, in document order
    pub fn elements(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![&self.root],
        }
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    /// Whether this element has the given local name in the given namespace
    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name() == local_name && self.namespace.as_deref() == namespace
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Direct child elements
    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate this element and all its descendants in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Visit this element and all its descendants in document order
    pub fn visit_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(e) = child {
                e.visit_mut(f);
            }
        }
    }

    /// Detach every descendant element for which `keep` returns false
    ///
    /// A removed element takes its whole subtree and any whitespace-only
    /// text directly following it. Kept elements are searched recursively.
    /// Returns the number of elements detached (subtrees count once).
    pub fn retain_descendants<F: FnMut(&Element) -> bool>(&mut self, keep: &mut F) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.children.len() {
            let detach = match &self.children[i] {
                Node::Element(e) => !keep(e),
                _ => false,
            };
            if detach {
                self.children.remove(i);
                removed += 1;
                if matches!(self.children.get(i), Some(Node::Text(t)) if t.trim().is_empty()) {
                    self.children.remove(i);
                }
                continue;
            }
            if let Node::Element(e) = &mut self.children[i] {
                removed += e.retain_descendants(keep);
            }
            i += 1;
        }
        removed
    }
}

/// Pre-order iterator over an element subtree
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.child_elements().rev());
        Some(next)
    }
}

/// Split `prefix:local` into its parts
pub(crate) fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
