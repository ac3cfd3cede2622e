//! Markup serialization.
//!
//! Output is canonical for this crate's parser: re-parsing the result and
//! serializing again yields the same string. Attribute order is preserved,
//! values are always double-quoted, void elements get no end tag and raw text
//! elements are written verbatim.

use crate::document::Document;
use crate::entities::{escape_attribute, escape_text};
use crate::types::{NodeKind, is_rawtext_element, is_void_element};
use core_types::NodeId;

impl Document {
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self.element_name(id).is_some_and(is_rawtext_element);
        for child in self.children(id) {
            write_node(self, *child, raw, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        write_node(self, id, false, &mut out);
        out
    }

    /// Parses `markup` as a fragment and serializes it back.
    ///
    /// The temporary nodes stay in the arena, detached; callers that
    /// canonicalize often should use a scratch document.
    pub fn canonicalize(&mut self, markup: &str) -> String {
        let mut out = String::new();
        for node in self.parse_fragment(markup) {
            write_node(self, node, false, &mut out);
        }
        out
    }
}

fn write_node(doc: &Document, id: NodeId, raw_parent: bool, out: &mut String) {
    match doc.kind(id) {
        Some(NodeKind::Text(text)) if raw_parent => out.push_str(text),
        Some(NodeKind::Text(text)) => escape_text(text, out),
        Some(NodeKind::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Some(NodeKind::Element { name, attributes }) => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            out.push('>');
            if is_void_element(name) {
                return;
            }
            let raw = is_rawtext_element(name);
            for child in doc.children(id) {
                write_node(doc, *child, raw, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Some(NodeKind::Document) => {
            for child in doc.children(id) {
                write_node(doc, *child, false, out);
            }
        }
        None => {}
    }
}
