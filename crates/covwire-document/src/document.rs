//! Whole-document wrapper: optional declaration, prolog, root, epilog

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ParseError;
use crate::node::{Element, Node};

/// `<?xml version=".." encoding=".." standalone=".."?>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Markup version, usually `1.0`
    pub version: String,
    /// Declared encoding
    pub encoding: Option<String>,
    /// Declared standalone flag
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: None,
        }
    }
}

/// Parsed document
///
/// Comments, processing instructions and doctype nodes around the root are
/// kept in `prolog`/`epilog` so they survive a parse/serialize cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    /// Document with a default declaration and the given root
    #[inline]
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self {
            declaration: Some(Declaration::default()),
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Assemble from parsed parts
    #[inline]
    #[must_use]
    pub fn from_parts(
        declaration: Option<Declaration>,
        prolog: Vec<Node>,
        root: Element,
        epilog: Vec<Node>,
    ) -> Self {
        Self {
            declaration,
            prolog,
            root,
            epilog,
        }
    }

    /// Parse markup text
    ///
    /// # Errors
    /// Returns [`ParseError`] if the markup is malformed
    #[inline]
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        crate::parser::parse(text)
    }

    /// Serialize to markup text
    #[inline]
    #[must_use]
    pub fn to_markup(&self) -> String {
        crate::serializer::serialize(self)
    }

    /// Declaration, if the source had one
    #[inline]
    #[must_use]
    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    /// Nodes before the root
    #[inline]
    #[must_use]
    pub fn prolog(&self) -> &[Node] {
        &self.prolog
    }

    /// Nodes after the root
    #[inline]
    #[must_use]
    pub fn epilog(&self) -> &[Node] {
        &self.epilog
    }

    /// Root element
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Mutable root element
    #[inline]
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Discard everything but the root
    #[inline]
    #[must_use]
    pub fn into_root(self) -> Element {
        self.root
    }
}

impl FromStr for Document {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}
