use crate::selector::{Combinator, ComplexSelector, Compound, Selector, SelectorList};
use html::{Document, NodeId};

fn matches_simple(doc: &Document, node: NodeId, selector: &Selector) -> bool {
    match selector {
        Selector::Universal => true,
        Selector::Type(t) => doc
            .element_name(node)
            .is_some_and(|name| name.eq_ignore_ascii_case(t)),
        Selector::Id(want) => doc.attribute(node, "id") == Some(want.as_str()),
        Selector::Class(want) => doc
            .attribute(node, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == want)),
        Selector::Attribute { name, value } => match (doc.attribute(node, name), value) {
            (Some(_), None) => true,
            (Some(actual), Some(want)) => actual == want,
            (None, _) => false,
        },
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    doc.is_element(node) && compound.0.iter().all(|s| matches_simple(doc, node, s))
}

/// Right-to-left match with backtracking over descendant combinators.
fn matches_from(doc: &Document, node: NodeId, complex: &ComplexSelector, index: usize) -> bool {
    if !matches_compound(doc, node, &complex.compounds[index]) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match complex.combinators[index - 1] {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|parent| matches_from(doc, parent, complex, index - 1)),
        Combinator::Descendant => {
            let mut cursor = doc.parent(node);
            while let Some(ancestor) = cursor {
                if matches_from(doc, ancestor, complex, index - 1) {
                    return true;
                }
                cursor = doc.parent(ancestor);
            }
            false
        }
    }
}

pub fn matches(doc: &Document, node: NodeId, list: &SelectorList) -> bool {
    list.0
        .iter()
        .any(|complex| matches_from(doc, node, complex, complex.compounds.len() - 1))
}

/// Elements under `root` (exclusive) matching `list`, in document order.
///
/// Like `querySelectorAll`, ancestors above `root` still count for
/// combinators.
pub fn query_all(doc: &Document, root: NodeId, list: &SelectorList) -> Vec<NodeId> {
    doc.descendant_elements(root)
        .into_iter()
        .filter(|node| matches(doc, *node, list))
        .collect()
}

pub fn query_first(doc: &Document, root: NodeId, list: &SelectorList) -> Option<NodeId> {
    doc.descendant_elements(root)
        .into_iter()
        .find(|node| matches(doc, *node, list))
}
