//! Per-(node, property) bookkeeping.

use core_types::{DirectiveId, NodeId, SubscriptionId};

/// Which property of a node a directive controls.
///
/// The derived order is the write order inside one node during a flush.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    Content,
    Classes,
    Attribute(String),
    Position,
    /// Presence of a tracked copy of the node.
    Mirror,
}

impl PropertyKey {
    /// Structural properties move or duplicate the node itself.
    pub fn is_structural(&self) -> bool {
        matches!(self, PropertyKey::Position | PropertyKey::Mirror)
    }
}

/// Where a node sits: under `parent`, before `before` (or last).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub parent: NodeId,
    pub before: Option<NodeId>,
}

impl Placement {
    /// Whether a node sitting at `live` already fulfils this target. Without
    /// an anchor only the parent matters.
    pub fn is_satisfied_by(&self, live: &Placement) -> bool {
        self.parent == live.parent && (self.before.is_none() || self.before == live.before)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    /// Markup for content, the serialized token list for classes.
    Text(String),
    /// `None` means the attribute is absent.
    Attribute(Option<String>),
    /// `None` means detached.
    Placement(Option<Placement>),
    Mirror(bool),
}

impl PropertyValue {
    pub fn as_text(&self) -> &str {
        match self {
            PropertyValue::Text(text) => text,
            _ => "",
        }
    }

    pub fn as_attribute(&self) -> Option<&str> {
        match self {
            PropertyValue::Attribute(value) => value.as_deref(),
            _ => None,
        }
    }

    /// Whether the tree showing `live` needs no write to reach `self`.
    /// Placements compare by target, every other value by equality.
    pub fn is_satisfied_by(&self, live: &PropertyValue) -> bool {
        match (self, live) {
            (PropertyValue::Placement(Some(target)), PropertyValue::Placement(Some(live))) => {
                target.is_satisfied_by(live)
            }
            _ => self == live,
        }
    }
}

/// State of one mutated property of one node.
#[derive(Debug)]
pub struct PropertyRecord {
    pub(crate) original: PropertyValue,
    pub(crate) virtual_value: PropertyValue,
    pub(crate) dirty: bool,
    pub(crate) operators: Vec<DirectiveId>,
    pub(crate) subscription: SubscriptionId,
}

impl PropertyRecord {
    pub(crate) fn new(live: PropertyValue, subscription: SubscriptionId) -> Self {
        Self {
            virtual_value: live.clone(),
            original: live,
            dirty: false,
            operators: Vec::new(),
            subscription,
        }
    }

    /// Value the property had before any operator, or the last value an
    /// external change left behind.
    pub fn original(&self) -> &PropertyValue {
        &self.original
    }

    /// Value the engine wants the property to have.
    pub fn virtual_value(&self) -> &PropertyValue {
        &self.virtual_value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Contributing directives in fold order.
    pub fn operators(&self) -> &[DirectiveId] {
        &self.operators
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Inserts keeping ascending id order. Returns `false` if already present.
    pub(crate) fn add_operator(&mut self, id: DirectiveId) -> bool {
        match self.operators.binary_search(&id) {
            Ok(_) => false,
            Err(at) => {
                self.operators.insert(at, id);
                true
            }
        }
    }

    pub(crate) fn remove_operator(&mut self, id: DirectiveId) -> bool {
        match self.operators.binary_search(&id) {
            Ok(at) => {
                self.operators.remove(at);
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_stay_sorted_by_directive_id() {
        let mut record = PropertyRecord::new(PropertyValue::Text(String::new()), SubscriptionId(1));
        assert!(record.add_operator(DirectiveId(5)));
        assert!(record.add_operator(DirectiveId(2)));
        assert!(!record.add_operator(DirectiveId(5)));
        assert!(record.add_operator(DirectiveId(3)));
        assert_eq!(record.operators(), &[DirectiveId(2), DirectiveId(3), DirectiveId(5)]);
        assert!(record.remove_operator(DirectiveId(3)));
        assert!(!record.remove_operator(DirectiveId(3)));
        assert_eq!(record.operators(), &[DirectiveId(2), DirectiveId(5)]);
    }

    #[test]
    fn keys_order_content_before_structure() {
        let mut keys = vec![
            PropertyKey::Mirror,
            PropertyKey::Position,
            PropertyKey::Attribute("title".into()),
            PropertyKey::Classes,
            PropertyKey::Content,
        ];
        keys.sort();
        assert_eq!(keys[0], PropertyKey::Content);
        assert_eq!(keys[4], PropertyKey::Mirror);
        assert!(keys[3].is_structural());
        assert!(!keys[2].is_structural());
    }

    #[test]
    fn append_target_ignores_later_siblings() {
        let append = Placement { parent: NodeId(1), before: None };
        let anchored = Placement { parent: NodeId(1), before: Some(NodeId(4)) };
        let followed = Placement { parent: NodeId(1), before: Some(NodeId(7)) };

        assert!(append.is_satisfied_by(&followed));
        assert!(!append.is_satisfied_by(&Placement { parent: NodeId(2), before: None }));
        assert!(anchored.is_satisfied_by(&anchored));
        assert!(!anchored.is_satisfied_by(&followed));
        assert!(!anchored.is_satisfied_by(&append));

        let target = PropertyValue::Placement(Some(append));
        assert!(target.is_satisfied_by(&PropertyValue::Placement(Some(followed))));
        assert!(!target.is_satisfied_by(&PropertyValue::Placement(None)));
        assert!(!PropertyValue::Placement(None).is_satisfied_by(&target));
    }
}
