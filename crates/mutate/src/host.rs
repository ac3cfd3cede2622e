//! Host capabilities the engine depends on.
//!
//! The engine never touches a tree directly. A host provides three things:
//! - [`Tree`]: selector matching plus raw reads and writes;
//! - [`ChangeSource`]: subscriptions that report changes after the tree settles;
//! - [`FrameScheduler`]: a request for one flush before the next paint.
//!
//! Notifications and frames are delivered back by whoever drives the host,
//! through [`Engine::notify`](crate::Engine::notify) and
//! [`Engine::flush`](crate::Engine::flush). Nothing here calls back into the
//! engine, so a host implementation never re-enters it mid-operation.

use core_types::{NodeId, SubscriptionId};

/// What a subscription listens for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChangeFilter {
    /// Any change in the node's subtree: child lists, text, attributes of the
    /// node or its descendants.
    Subtree,
    /// One attribute of the node itself.
    Attribute(String),
    /// Child list changes anywhere under the node.
    ChildList,
}

pub trait Tree {
    /// Root of the watched subtree, or `None` when no tree is available.
    fn root(&self) -> Option<NodeId>;

    /// Elements under `scope` (exclusive) matching `selector`, in document
    /// order. An invalid selector matches nothing.
    fn query_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId>;

    fn query_first(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        self.query_all(scope, selector).into_iter().next()
    }

    fn is_connected(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn next_element_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn inner_html(&self, node: NodeId) -> String;

    fn set_inner_html(&mut self, node: NodeId, markup: &str);

    /// Parses and re-serializes `markup` the way `set_inner_html` followed by
    /// `inner_html` would.
    fn canonicalize_html(&self, markup: &str) -> String;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Sets the attribute, or removes it when `value` is `None`.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&str>);

    /// Moves `node` under `parent`, before `before` or last when `None`.
    fn insert_before(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>);

    fn remove(&mut self, node: NodeId);

    /// Deep-copies `node` into a new detached subtree.
    fn clone_node(&mut self, node: NodeId) -> Option<NodeId>;
}

pub trait ChangeSource {
    fn subscribe(&mut self, node: NodeId, filter: ChangeFilter) -> SubscriptionId;

    /// Cancelling an unknown or already cancelled subscription is a no-op.
    fn cancel(&mut self, subscription: SubscriptionId);
}

pub trait FrameScheduler {
    /// Ask for [`Engine::flush`](crate::Engine::flush) to run before the next
    /// paint. The engine calls this at most once per pending flush.
    fn request_frame(&mut self);
}

/// Everything the engine needs from its environment.
pub trait Host: Tree + ChangeSource + FrameScheduler {}

impl<T: Tree + ChangeSource + FrameScheduler> Host for T {}
