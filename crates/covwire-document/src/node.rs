//! Node tree
//!
//! An [`Element`] owns its attributes and an ordered list of child [`Node`]s.
//! Children are addressed by position; removing a child never reorders the
//! remaining siblings.

use std::str::FromStr;

use crate::error::ParseError;

/// A child of an element (or a top-level item of a document)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data (already unescaped)
    Text(String),
    /// `<![CDATA[...]]>` section, kept verbatim
    CData(String),
    /// `<!-- ... -->`, kept verbatim
    Comment(String),
    /// `<? ... ?>`, kept verbatim
    ProcessingInstruction(String),
    /// `<!DOCTYPE ...>`, kept verbatim
    DocType(String),
}

impl Node {
    /// Element payload, if this node is an element
    #[inline]
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable element payload, if this node is an element
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Whether this node carries character data
    #[inline]
    #[must_use]
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text(_) | Self::CData(_))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// Name/value attribute pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name (prefix kept as written)
    pub name: String,
    /// Unescaped value
    pub value: String,
}

/// Named element with attributes and ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Create empty element
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Qualified element name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attribute value by name
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set attribute, keeping its position if it already exists
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
        self
    }

    /// Builder form of [`Element::set_attribute`]
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Remove attribute, returning its value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    /// All child nodes in order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Whether the element has any child node at all
    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Child elements in order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Child elements with the given name, in order
    pub fn children_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// First child element with the given name
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Mutable first child element with the given name
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|e| e.name == name)
    }

    /// First child element matching `predicate`
    pub fn find_child(&self, mut predicate: impl FnMut(&Element) -> bool) -> Option<&Element> {
        self.elements().find(|e| predicate(e))
    }

    /// Mutable first child element matching `predicate`
    pub fn find_child_mut(
        &mut self,
        mut predicate: impl FnMut(&Element) -> bool,
    ) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|e| predicate(e))
    }

    /// Text content of the first child element with the given name
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text)
    }

    /// Concatenated character data of the direct children
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) | Node::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node
    ///
    /// An empty value leaves the element without children.
    pub fn set_text(&mut self, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        self.children.clear();
        if !value.is_empty() {
            self.children.push(Node::Text(value));
        }
        self
    }

    /// Builder form of [`Element::set_text`]
    #[inline]
    #[must_use]
    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        self.set_text(value);
        self
    }

    /// Builder form of [`Element::push_child`]
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Append a new empty child element and return it
    pub fn create_child(&mut self, name: impl Into<String>) -> &mut Element {
        self.push_child(Element::new(name))
    }

    /// Append an existing element as the last child and return it
    ///
    /// Whitespace-only text the element held becomes layout and is dropped.
    pub fn push_child(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        self.drop_layout_whitespace();
        match self.children.last_mut() {
            Some(Node::Element(element)) => element,
            _ => unreachable!("element was pushed above"),
        }
    }

    /// Append any node as the last child
    pub fn push_node(&mut self, node: Node) {
        self.children.push(node);
        self.drop_layout_whitespace();
    }

    /// Append a node without normalizing surrounding whitespace
    pub(crate) fn append_raw(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Whether any child carries character data other than whitespace
    #[must_use]
    pub fn has_character_data(&self) -> bool {
        self.children.iter().any(|node| match node {
            Node::Text(text) => !text.trim().is_empty(),
            Node::CData(_) => true,
            _ => false,
        })
    }

    /// Whether the element holds nothing but whitespace-only text
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.children
            .iter()
            .all(|node| matches!(node, Node::Text(text) if text.trim().is_empty()))
    }

    /// Drop whitespace-only text that only separates markup
    ///
    /// Whitespace that is the element's only content, or that sits next to
    /// real character data, is kept.
    pub fn drop_layout_whitespace(&mut self) {
        let has_markup = self.children.iter().any(|node| !node.is_textual());
        if has_markup && !self.has_character_data() {
            self.children.retain(|node| !matches!(node, Node::Text(_)));
        }
    }

    /// First child element with the given name, created at the end if missing
    pub fn child_or_create(&mut self, name: &str) -> &mut Element {
        let index = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.name == name));
        match index {
            Some(index) => match &mut self.children[index] {
                Node::Element(element) => element,
                _ => unreachable!("position matched an element"),
            },
            None => self.create_child(name),
        }
    }

    /// Walk down by child names
    #[must_use]
    pub fn descend(&self, path: &[&str]) -> Option<&Element> {
        let mut current = self;
        for segment in path {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Walk down by child names, mutably
    pub fn descend_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for segment in path {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Walk down by child names, creating missing levels
    pub fn descend_or_create(&mut self, path: &[&str]) -> &mut Element {
        let mut current = self;
        for segment in path {
            current = current.child_or_create(segment);
        }
        current
    }

    /// Sibling index of the first child element matching `predicate`
    pub fn position_of(&self, mut predicate: impl FnMut(&Element) -> bool) -> Option<usize> {
        self.children
            .iter()
            .position(|node| node.as_element().is_some_and(&mut predicate))
    }

    /// Remove the child at `index`; remaining siblings keep their order
    pub fn remove_child(&mut self, index: usize) -> Option<Node> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Remove every child element matching `predicate`, returning them in order
    pub fn remove_children_where(
        &mut self,
        mut predicate: impl FnMut(&Element) -> bool,
    ) -> Vec<Element> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        for node in self.children.drain(..) {
            match node {
                Node::Element(element) if predicate(&element) => removed.push(element),
                other => kept.push(other),
            }
        }
        self.children = kept;
        removed
    }

    /// Drop all children
    #[inline]
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Parse a standalone element from markup
    ///
    /// # Errors
    /// Returns [`ParseError`] if the markup is malformed
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        crate::parser::parse(text).map(crate::Document::into_root)
    }

    /// Serialize this element (and its subtree) as markup
    #[must_use]
    pub fn to_markup(&self) -> String {
        crate::serializer::serialize_element(self)
    }
}

impl FromStr for Element {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
