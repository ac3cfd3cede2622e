use crate::document::Document;
use crate::types::{NodeKind, Token};
use core_types::NodeId;

/// Builds detached nodes for a token stream and returns the top-level ones in
/// document order.
///
/// End tags close the nearest open element with the same name; an end tag
/// with no matching open element is dropped. Elements still open at the end
/// are closed implicitly, so `<b>foo` becomes `<b>foo</b>`.
pub(crate) fn build_fragment(doc: &mut Document, tokens: Vec<Token>) -> Vec<NodeId> {
    let mut top_level = Vec::new();
    let mut open_elements: Vec<(NodeId, String)> = Vec::new();

    for token in tokens {
        match token {
            Token::Text(text) => {
                let id = doc.alloc(NodeKind::Text(text));
                place(doc, &open_elements, &mut top_level, id);
            }
            Token::Comment(text) => {
                let id = doc.alloc(NodeKind::Comment(text));
                place(doc, &open_elements, &mut top_level, id);
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let id = doc.alloc(NodeKind::Element {
                    name: name.clone(),
                    attributes,
                });
                place(doc, &open_elements, &mut top_level, id);
                if !self_closing {
                    open_elements.push((id, name));
                }
            }
            Token::EndTag(name) => {
                if let Some(pos) = open_elements.iter().rposition(|(_, open)| *open == name) {
                    open_elements.truncate(pos);
                }
            }
        }
    }

    top_level
}

fn place(doc: &mut Document, open: &[(NodeId, String)], top_level: &mut Vec<NodeId>, id: NodeId) {
    match open.last() {
        Some((parent, _)) => doc.link_last_child(*parent, id),
        None => top_level.push(id),
    }
}
