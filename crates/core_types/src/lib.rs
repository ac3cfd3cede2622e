//! Handle types shared between the document host and the mutation engine.
//!
//! These are plain integers on purpose: the engine never owns nodes, it only
//! refers to them, and the host decides what a handle points at.

use std::fmt;

/// Opaque handle to a node of the live document tree.
///
/// For the in-memory host this is an arena index. A handle stays valid (and
/// comparable) after the node is detached; only the host knows whether the
/// node is still connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by a change-notification subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Identity of one registered directive.
///
/// Ids are handed out in creation order; operators on a shared property are
/// folded in ascending id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectiveId(pub u64);

impl DirectiveId {
    pub const fn next(self) -> Self {
        DirectiveId(self.0 + 1)
    }
}

impl fmt::Display for DirectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}
