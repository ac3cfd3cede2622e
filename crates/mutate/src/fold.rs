//! Reading live values and folding operators into virtual values.

use crate::class_list::ClassList;
use crate::clone::CloneRegistry;
use crate::config::EngineConfig;
use crate::directive::{DirectiveRegistry, Operator, Position};
use crate::host::Tree;
use crate::record::{Placement, PropertyKey, PropertyRecord, PropertyValue};
use core_types::NodeId;

/// Current value of `key` on `node` as the tree reports it.
pub(crate) fn read_live<T: Tree>(
    tree: &T,
    clones: &CloneRegistry,
    node: NodeId,
    key: &PropertyKey,
) -> PropertyValue {
    match key {
        PropertyKey::Content => PropertyValue::Text(tree.inner_html(node)),
        PropertyKey::Classes => {
            PropertyValue::Text(tree.attribute(node, "class").unwrap_or_default())
        }
        PropertyKey::Attribute(name) => PropertyValue::Attribute(tree.attribute(node, name)),
        PropertyKey::Position => PropertyValue::Placement(tree.parent(node).map(|parent| {
            Placement {
                parent,
                before: tree.next_element_sibling(node),
            }
        })),
        PropertyKey::Mirror => PropertyValue::Mirror(clones.is_present(tree, node)),
    }
}

/// Virtual value of `record`: its operators applied in ascending directive
/// id order.
pub(crate) fn fold<T: Tree>(
    tree: &T,
    directives: &DirectiveRegistry,
    config: &EngineConfig,
    node: NodeId,
    key: &PropertyKey,
    record: &PropertyRecord,
) -> PropertyValue {
    if record.operators.is_empty() {
        return match key {
            PropertyKey::Mirror => PropertyValue::Mirror(false),
            PropertyKey::Position => restorable_placement(tree, &record.original),
            _ => record.original.clone(),
        };
    }
    let operators = record
        .operators
        .iter()
        .filter_map(|id| directives.operator(*id));

    match key {
        PropertyKey::Content => {
            let mut markup = record.original.as_text().to_string();
            for op in operators {
                if let Operator::Content(transform) = op {
                    markup = transform(&markup);
                }
            }
            if config.canonicalize_content {
                markup = tree.canonicalize_html(&markup);
            }
            PropertyValue::Text(markup)
        }
        PropertyKey::Classes => {
            let mut classes = ClassList::parse(record.original.as_text());
            for op in operators {
                if let Operator::Classes(edit) = op {
                    edit(&mut classes);
                }
            }
            PropertyValue::Text(classes.to_string())
        }
        PropertyKey::Attribute(_) => {
            let mut value = record.original.as_attribute().map(str::to_string);
            for op in operators {
                if let Operator::Attribute { transform, .. } = op {
                    value = transform(value.as_deref());
                }
            }
            // An empty result removes the attribute.
            PropertyValue::Attribute(value.filter(|value| !value.is_empty()))
        }
        PropertyKey::Position => {
            // An unresolvable target keeps whatever was resolved last.
            let mut value = record.virtual_value.clone();
            for op in operators {
                if let Operator::Position(producer) = op {
                    match resolve_position(tree, node, &producer()) {
                        Some(placement) => value = PropertyValue::Placement(Some(placement)),
                        None => log::trace!(target: "mutate.fold", "position of {node} unresolved"),
                    }
                }
            }
            value
        }
        PropertyKey::Mirror => PropertyValue::Mirror(true),
    }
}

/// The original placement. An anchor that has since left the parent is
/// dropped and the node goes back last.
fn restorable_placement<T: Tree>(tree: &T, original: &PropertyValue) -> PropertyValue {
    match original {
        PropertyValue::Placement(Some(placement)) => PropertyValue::Placement(Some(Placement {
            parent: placement.parent,
            before: placement
                .before
                .filter(|anchor| tree.parent(*anchor) == Some(placement.parent)),
        })),
        other => other.clone(),
    }
}

/// Resolves a position target for `node`.
///
/// Fails when the parent is missing, lies inside `node`, or the anchor is
/// given but no other child of the parent matches it.
pub(crate) fn resolve_position<T: Tree>(
    tree: &T,
    node: NodeId,
    position: &Position,
) -> Option<Placement> {
    let root = tree.root()?;
    let parent = tree.query_first(root, &position.parent_selector)?;
    if is_inclusive_ancestor(tree, node, parent) {
        return None;
    }
    let before = match &position.insert_before_selector {
        Some(selector) => Some(
            tree.query_all(parent, selector)
                .into_iter()
                .find(|anchor| *anchor != node && tree.parent(*anchor) == Some(parent))?,
        ),
        None => None,
    };
    Some(Placement { parent, before })
}

fn is_inclusive_ancestor<T: Tree>(tree: &T, ancestor: NodeId, node: NodeId) -> bool {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if current == ancestor {
            return true;
        }
        cursor = tree.parent(current);
    }
    false
}
