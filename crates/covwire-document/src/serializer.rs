//! Markup serializer
//!
//! Deterministic output: four-space indentation for elements that only hold
//! elements (and comments/PIs), inline layout as soon as an element carries
//! character data so that mixed content round-trips unchanged.

use quick_xml::escape::{escape, partial_escape};

use crate::document::{Declaration, Document};
use crate::node::{Element, Node};

const INDENT: &str = "    ";

/// Serialize a whole document, declaration and surrounding nodes included
#[must_use]
pub fn serialize(document: &Document) -> String {
    let mut out = String::new();
    if let Some(declaration) = document.declaration() {
        write_declaration(&mut out, declaration);
        out.push('\n');
    }
    for node in document.prolog() {
        write_node(&mut out, node, Layout::Indented(0));
        out.push('\n');
    }
    write_element(&mut out, document.root(), Layout::Indented(0));
    out.push('\n');
    for node in document.epilog() {
        write_node(&mut out, node, Layout::Indented(0));
        out.push('\n');
    }
    out
}

/// Serialize a single element subtree without declaration or trailing newline
#[must_use]
pub fn serialize_element(element: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, element, Layout::Indented(0));
    out
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    Indented(usize),
    Inline,
}

fn write_declaration(out: &mut String, declaration: &Declaration) {
    out.push_str("<?xml version=\"");
    out.push_str(&escape(declaration.version.as_str()));
    out.push('"');
    if let Some(encoding) = &declaration.encoding {
        out.push_str(" encoding=\"");
        out.push_str(&escape(encoding.as_str()));
        out.push('"');
    }
    if let Some(standalone) = &declaration.standalone {
        out.push_str(" standalone=\"");
        out.push_str(&escape(standalone.as_str()));
        out.push('"');
    }
    out.push_str("?>");
}

fn indent(out: &mut String, layout: Layout) {
    if let Layout::Indented(depth) = layout {
        for _ in 0..depth {
            out.push_str(INDENT);
        }
    }
}

fn write_node(out: &mut String, node: &Node, layout: Layout) {
    if let Node::Element(element) = node {
        write_element(out, element, layout);
        return;
    }
    indent(out, layout);
    match node {
        Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
        Node::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::ProcessingInstruction(pi) => {
            out.push_str("<?");
            out.push_str(pi);
            out.push_str("?>");
        }
        Node::DocType(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype.trim_start());
            out.push('>');
        }
        Node::Element(_) => {}
    }
}

fn write_element(out: &mut String, element: &Element, layout: Layout) {
    indent(out, layout);
    out.push('<');
    out.push_str(element.name());
    for attribute in element.attributes() {
        out.push(' ');
        out.push_str(&attribute.name);
        out.push_str("=\"");
        out.push_str(&escape(attribute.value.as_str()));
        out.push('"');
    }

    if !element.has_children() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    let inline =
        matches!(layout, Layout::Inline) || element.children().iter().any(Node::is_textual);
    if inline {
        for child in element.children() {
            write_node(out, child, Layout::Inline);
        }
    } else {
        let depth = match layout {
            Layout::Indented(depth) => depth,
            Layout::Inline => 0,
        };
        for child in element.children() {
            out.push('\n');
            write_node(out, child, Layout::Indented(depth + 1));
        }
        out.push('\n');
        indent(out, layout);
    }

    out.push_str("</");
    out.push_str(element.name());
    out.push('>');
}
