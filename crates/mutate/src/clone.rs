//! Tracked copies of nodes.
//!
//! Removal is two-phase: a copy is marked when its clone directive stops
//! applying and detached by [`CloneRegistry::sweep`] at the end of the flush.
//! Re-marking a copy as wanted before the sweep keeps it.

use crate::host::Tree;
use core_types::NodeId;
use indexmap::IndexSet;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CloneRegistry {
    mirrors: HashMap<NodeId, NodeId>,
    originals: HashMap<NodeId, NodeId>,
    pending_removal: IndexSet<NodeId>,
}

impl CloneRegistry {
    pub fn mirror_of(&self, original: NodeId) -> Option<NodeId> {
        self.mirrors.get(&original).copied()
    }

    pub fn is_mirror(&self, node: NodeId) -> bool {
        self.originals.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    pub fn pending_removals(&self) -> usize {
        self.pending_removal.len()
    }

    /// Whether `original` currently has a connected copy that is not about to
    /// be removed.
    pub(crate) fn is_present<T: Tree>(&self, tree: &T, original: NodeId) -> bool {
        self.mirror_of(original)
            .is_some_and(|m| !self.pending_removal.contains(&m) && tree.is_connected(m))
    }

    /// Makes sure `original` has a connected copy, creating one if needed.
    ///
    /// A new copy goes under `parent` (last) or right after the original.
    pub(crate) fn ensure<T: Tree>(
        &mut self,
        tree: &mut T,
        original: NodeId,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let mirror = match self.mirror_of(original) {
            Some(mirror) => {
                self.pending_removal.shift_remove(&mirror);
                mirror
            }
            None => {
                let mirror = tree.clone_node(original)?;
                self.mirrors.insert(original, mirror);
                self.originals.insert(mirror, original);
                log::debug!(target: "mutate.clone", "copied {original} as {mirror}");
                mirror
            }
        };
        if tree.is_connected(mirror) {
            return Some(mirror);
        }
        match parent {
            Some(parent) => tree.insert_before(parent, mirror, None),
            None => {
                let parent = tree.parent(original)?;
                let before = tree.next_element_sibling(original);
                tree.insert_before(parent, mirror, before);
            }
        }
        Some(mirror)
    }

    pub(crate) fn mark_for_removal(&mut self, original: NodeId) {
        if let Some(mirror) = self.mirror_of(original) {
            self.pending_removal.insert(mirror);
        }
    }

    /// Detaches every marked copy and forgets it. Returns how many went.
    pub(crate) fn sweep<T: Tree>(&mut self, tree: &mut T) -> usize {
        let swept = self.pending_removal.len();
        for mirror in self.pending_removal.drain(..) {
            tree.remove(mirror);
            if let Some(original) = self.originals.remove(&mirror) {
                self.mirrors.remove(&original);
            }
            log::debug!(target: "mutate.clone", "removed copy {mirror}");
        }
        swept
    }
}
