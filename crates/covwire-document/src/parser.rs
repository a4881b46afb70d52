//! Markup parser
//!
//! Uses quick-xml as the tokenizer and assembles an owned [`Document`].
//! Whitespace-only text that only separates markup is layout and is dropped
//! when its element closes. Whitespace that is an element's whole content is
//! kept, as is any other text (after entity unescaping).

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;

use crate::document::{Declaration, Document};
use crate::error::ParseError;
use crate::node::{Element, Node};

/// Parse markup text into a [`Document`]
///
/// # Errors
/// - `ParseError::Syntax` for tokenizer errors (bad entities, mismatched tags)
/// - `ParseError::NoRootElement` / `MultipleRoots` for a wrong top-level shape
/// - `ParseError::UnclosedElement` if input ends inside an element
pub fn parse(text: &str) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(text);
    let mut builder = TreeBuilder::default();

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| ParseError::syntax(reader.buffer_position() as u64, e))?;

        match event {
            Event::Decl(decl) => builder.declaration(read_declaration(&decl, position)?, position)?,
            Event::Start(start) => builder.open(read_element(&start, position)?, position)?,
            Event::Empty(start) => builder.leaf(read_element(&start, position)?, position)?,
            Event::End(_) => builder.close(position)?,
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| ParseError::syntax(position, e))?;
                builder.text(value.into_owned(), position)?;
            }
            Event::CData(data) => builder.node(Node::CData(utf8(&data, position)?)),
            Event::Comment(comment) => builder.node(Node::Comment(utf8(&comment, position)?)),
            Event::PI(pi) => builder.node(Node::ProcessingInstruction(utf8(&pi, position)?)),
            Event::DocType(doctype) => builder.node(Node::DocType(utf8(&doctype, position)?)),
            Event::Eof => break,
        }
    }

    builder.finish()
}

fn utf8(bytes: &[u8], position: u64) -> Result<String, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ParseError::syntax(position, e))
}

fn read_element(start: &BytesStart<'_>, position: u64) -> Result<Element, ParseError> {
    let mut element = Element::new(utf8(start.name().as_ref(), position)?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ParseError::syntax(position, e))?;
        let name = utf8(attribute.key.as_ref(), position)?;
        let value = attribute
            .unescape_value()
            .map_err(|e| ParseError::syntax(position, e))?;
        element.set_attribute(name, value.into_owned());
    }
    Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>, position: u64) -> Result<Declaration, ParseError> {
    let version = decl.version().map_err(|e| ParseError::syntax(position, e))?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(|e| ParseError::syntax(position, e))?;
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(|e| ParseError::syntax(position, e))?;

    Ok(Declaration {
        version: utf8(&version, position)?,
        encoding: encoding.map(|e| utf8(&e, position)).transpose()?,
        standalone: standalone.map(|s| utf8(&s, position)).transpose()?,
    })
}

/// Stack-based assembler fed by tokenizer events
#[derive(Debug, Default)]
struct TreeBuilder {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn declaration(&mut self, declaration: Declaration, position: u64) -> Result<(), ParseError> {
        if self.declaration.is_some() || self.root.is_some() || !self.open.is_empty() {
            return Err(ParseError::syntax(position, "misplaced declaration"));
        }
        self.declaration = Some(declaration);
        Ok(())
    }

    fn open(&mut self, element: Element, position: u64) -> Result<(), ParseError> {
        self.check_root_slot(position)?;
        self.open.push(element);
        Ok(())
    }

    fn leaf(&mut self, element: Element, position: u64) -> Result<(), ParseError> {
        self.check_root_slot(position)?;
        self.attach(element);
        Ok(())
    }

    fn close(&mut self, position: u64) -> Result<(), ParseError> {
        let mut element = self
            .open
            .pop()
            .ok_or_else(|| ParseError::syntax(position, "closing tag without opening tag"))?;
        element.drop_layout_whitespace();
        self.attach(element);
        Ok(())
    }

    fn text(&mut self, value: String, position: u64) -> Result<(), ParseError> {
        if value.is_empty() {
            return Ok(());
        }
        match self.open.last_mut() {
            Some(parent) => {
                parent.append_raw(Node::Text(value));
                Ok(())
            }
            None if value.trim().is_empty() => Ok(()),
            None => Err(ParseError::TextOutsideRoot { position }),
        }
    }

    fn node(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.append_raw(node),
            None if self.root.is_none() => self.prolog.push(node),
            None => self.epilog.push(node),
        }
    }

    fn check_root_slot(&self, position: u64) -> Result<(), ParseError> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(ParseError::MultipleRoots { position });
        }
        Ok(())
    }

    fn attach(&mut self, element: Element) {
        match self.open.last_mut() {
            Some(parent) => parent.append_raw(Node::Element(element)),
            None => self.root = Some(element),
        }
    }

    fn finish(self) -> Result<Document, ParseError> {
        if let Some(unclosed) = self.open.last() {
            return Err(ParseError::UnclosedElement(unclosed.name().to_string()));
        }
        let root = self.root.ok_or(ParseError::NoRootElement)?;
        tracing::trace!(root = root.name(), children = root.children().len(), "document parsed");
        Ok(Document::from_parts(
            self.declaration,
            self.prolog,
            root,
            self.epilog,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested_elements() {
        let doc = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <profiles>
    <profile><id>jacoco</id></profile>
  </profiles>
</project>"#,
        )
        .unwrap();

        assert_eq!(doc.root().name(), "project");
        let profile = doc.root().descend(&["profiles", "profile"]).unwrap();
        assert_eq!(profile.child_text("id").as_deref(), Some("jacoco"));
        assert_eq!(doc.declaration().map(|d| d.version.as_str()), Some("1.0"));
        assert_eq!(
            doc.declaration().and_then(|d| d.encoding.as_deref()),
            Some("UTF-8")
        );
    }

    #[test]
    fn parse_drops_layout_whitespace() {
        let doc = parse("<a>\n  <b/>\n  <c/>\n</a>").unwrap();
        assert_eq!(doc.root().children().len(), 2);
    }

    #[test]
    fn parse_keeps_whitespace_only_content() {
        let doc = parse("<properties>\n  <sep> </sep>\n  <tab>\t</tab>\n</properties>").unwrap();
        assert_eq!(doc.root().elements().count(), 2);
        assert_eq!(doc.root().child_text("sep").as_deref(), Some(" "));
        assert_eq!(doc.root().child_text("tab").as_deref(), Some("\t"));
    }

    #[test]
    fn parse_keeps_mixed_content_spacing() {
        let doc = parse("<d> <b>x</b> y</d>").unwrap();
        assert_eq!(doc.root().children().len(), 3);
        assert_eq!(doc.root().text(), "  y");
    }

    #[test]
    fn parse_drops_whitespace_around_comments() {
        let doc = parse("<a>\n  <!-- c -->\n</a>").unwrap();
        assert_eq!(doc.root().children(), &[Node::Comment(" c ".into())]);
    }

    #[test]
    fn parse_attributes_and_entities() {
        let doc =
            parse(r#"<container qualifier="a&amp;b"><v>${x} &lt; 2</v></container>"#).unwrap();
        assert_eq!(doc.root().attribute("qualifier"), Some("a&b"));
        assert_eq!(doc.root().child_text("v").as_deref(), Some("${x} < 2"));
    }

    #[test]
    fn parse_keeps_comments() {
        let doc = parse("<!-- head --><a><!-- inner --><b/></a><!-- tail -->").unwrap();
        assert_eq!(doc.prolog(), &[Node::Comment(" head ".into())]);
        assert_eq!(doc.epilog(), &[Node::Comment(" tail ".into())]);
        assert_eq!(doc.root().children()[0], Node::Comment(" inner ".into()));
    }

    #[test]
    fn parse_rejects_mismatched_tags() {
        assert!(matches!(parse("<a><b></a>"), Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn parse_rejects_unclosed() {
        assert!(matches!(
            parse("<a><b>"),
            Err(ParseError::UnclosedElement(_) | ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert_eq!(parse(""), Err(ParseError::NoRootElement));
        assert_eq!(parse("   "), Err(ParseError::NoRootElement));
    }

    #[test]
    fn parse_rejects_two_roots() {
        assert!(matches!(
            parse("<a/><b/>"),
            Err(ParseError::MultipleRoots { .. })
        ));
    }

    #[test]
    fn parse_rejects_stray_text() {
        assert!(matches!(
            parse("<a/>trailing"),
            Err(ParseError::TextOutsideRoot { .. })
        ));
    }
}
