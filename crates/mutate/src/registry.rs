use crate::record::{PropertyKey, PropertyRecord};
use core_types::NodeId;
use std::collections::BTreeMap;

/// Mutated properties of one node.
#[derive(Debug, Default)]
pub struct ElementRecord {
    properties: BTreeMap<PropertyKey, PropertyRecord>,
}

impl ElementRecord {
    pub fn get(&self, key: &PropertyKey) -> Option<&PropertyRecord> {
        self.properties.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.properties.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Every node with at least one live property record.
///
/// Entries are removed as soon as their last property record goes.
#[derive(Debug, Default)]
pub(crate) struct NodeRegistry {
    entries: BTreeMap<NodeId, ElementRecord>,
}

impl NodeRegistry {
    pub(crate) fn get(&self, node: NodeId, key: &PropertyKey) -> Option<&PropertyRecord> {
        self.entries.get(&node)?.properties.get(key)
    }

    pub(crate) fn get_mut(&mut self, node: NodeId, key: &PropertyKey) -> Option<&mut PropertyRecord> {
        self.entries.get_mut(&node)?.properties.get_mut(key)
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&ElementRecord> {
        self.entries.get(&node)
    }

    pub(crate) fn insert(&mut self, node: NodeId, key: PropertyKey, record: PropertyRecord) {
        self.entries
            .entry(node)
            .or_default()
            .properties
            .insert(key, record);
    }

    pub(crate) fn remove(&mut self, node: NodeId, key: &PropertyKey) -> Option<PropertyRecord> {
        let entry = self.entries.get_mut(&node)?;
        let removed = entry.properties.remove(key);
        if entry.is_empty() {
            self.entries.remove(&node);
        }
        removed
    }

    pub(crate) fn nodes(&self) -> Vec<NodeId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn keys(&self, node: NodeId) -> Vec<PropertyKey> {
        self.entries
            .get(&node)
            .map(|entry| entry.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PropertyValue;
    use core_types::SubscriptionId;

    fn record() -> PropertyRecord {
        PropertyRecord::new(PropertyValue::Attribute(None), SubscriptionId(0))
    }

    #[test]
    fn entry_disappears_with_last_property() {
        let mut registry = NodeRegistry::default();
        let node = NodeId(4);
        registry.insert(node, PropertyKey::Content, record());
        registry.insert(node, PropertyKey::Classes, record());
        assert_eq!(registry.keys(node), vec![PropertyKey::Content, PropertyKey::Classes]);

        assert!(registry.remove(node, &PropertyKey::Content).is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(node, &PropertyKey::Classes).is_some());
        assert_eq!(registry.len(), 0);
        assert!(registry.element(node).is_none());
        assert!(registry.remove(node, &PropertyKey::Classes).is_none());
    }

    #[test]
    fn nodes_iterate_in_handle_order() {
        let mut registry = NodeRegistry::default();
        registry.insert(NodeId(9), PropertyKey::Content, record());
        registry.insert(NodeId(2), PropertyKey::Content, record());
        assert_eq!(registry.nodes(), vec![NodeId(2), NodeId(9)]);
    }
}
