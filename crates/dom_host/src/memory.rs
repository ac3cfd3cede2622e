use core_types::{NodeId, SubscriptionId};
use html::{Document, Mutation, MutationKind};
use indexmap::{IndexMap, IndexSet};
use mutate::{ChangeFilter, ChangeSource, FrameScheduler, Tree};

#[derive(Clone, Debug)]
struct Watch {
    node: NodeId,
    filter: ChangeFilter,
}

impl Watch {
    fn matches(&self, mutation: &Mutation) -> bool {
        match &self.filter {
            ChangeFilter::Subtree => mutation.is_within(self.node),
            ChangeFilter::Attribute(name) => {
                mutation.target == self.node
                    && matches!(&mutation.kind, MutationKind::Attribute(changed) if changed.eq_ignore_ascii_case(name))
            }
            ChangeFilter::ChildList => {
                mutation.kind == MutationKind::ChildList && mutation.is_within(self.node)
            }
        }
    }
}

/// A document plus the notification and frame plumbing the engine expects.
///
/// A subscription only sees changes made after it was created. Notifications
/// are deduplicated per batch, in subscription order.
///
/// The document never frees nodes, since the engine keys its records by
/// `NodeId`. Each content write allocates a fresh subtree, so a host that
/// keeps reasserting content grows with every write.
#[derive(Debug)]
pub struct MemoryHost {
    doc: Option<Document>,
    watches: IndexMap<SubscriptionId, Watch>,
    next_subscription: u64,
    queued: IndexSet<SubscriptionId>,
    frame_requested: bool,
    writes: usize,
}

impl MemoryHost {
    /// A host whose body holds `markup`.
    pub fn new(markup: &str) -> Self {
        Self::from_document(Document::parse(markup))
    }

    pub fn from_document(doc: Document) -> Self {
        Self::with_tree(Some(doc))
    }

    /// A host with no tree at all; every directive degrades to a no-op.
    pub fn no_tree() -> Self {
        Self::with_tree(None)
    }

    fn with_tree(doc: Option<Document>) -> Self {
        Self {
            doc,
            watches: IndexMap::new(),
            next_subscription: 0,
            queued: IndexSet::new(),
            frame_requested: false,
            writes: 0,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.doc.as_ref()
    }

    /// Edits made through this handle count as external changes.
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.doc.as_mut()
    }

    /// Serialized body, or an empty string without a tree.
    pub fn body_html(&self) -> String {
        self.doc
            .as_ref()
            .map(|doc| doc.inner_html(doc.body()))
            .unwrap_or_default()
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        self.doc
            .as_ref()
            .map(|doc| doc.outer_html(node))
            .unwrap_or_default()
    }

    /// Elements of the whole document matching `selector`.
    pub fn select(&self, selector: &str) -> Vec<NodeId> {
        match self.root() {
            Some(root) => self.query_all(root, selector),
            None => Vec::new(),
        }
    }

    pub fn select_first(&self, selector: &str) -> Option<NodeId> {
        self.select(selector).into_iter().next()
    }

    /// Raw tree writes issued by the engine so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn subscription_count(&self) -> usize {
        self.watches.len()
    }

    pub fn has_pending_work(&self) -> bool {
        self.frame_requested
            || !self.queued.is_empty()
            || self.doc.as_ref().is_some_and(Document::has_pending_mutations)
    }

    /// Drains notifications for every change logged so far.
    pub fn take_notifications(&mut self) -> Vec<SubscriptionId> {
        self.collect();
        self.queued.drain(..).collect()
    }

    /// Returns whether a frame was requested since the last call.
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }

    /// Matches the document's pending changes against live subscriptions.
    fn collect(&mut self) {
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        for mutation in doc.take_mutations() {
            for (id, watch) in &self.watches {
                if watch.matches(&mutation) && self.queued.insert(*id) {
                    log::trace!(target: "dom_host.notify", "{id:?} <- {mutation:?}");
                }
            }
        }
    }

    fn write(&mut self, what: &str, result: Result<(), html::TreeError>) {
        match result {
            Ok(()) => self.writes += 1,
            Err(err) => log::warn!(target: "dom_host", "{what} failed: {err}"),
        }
    }
}

impl Tree for MemoryHost {
    fn root(&self) -> Option<NodeId> {
        self.doc.as_ref().map(Document::root)
    }

    fn query_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(doc) = self.doc.as_ref() else {
            return Vec::new();
        };
        match css::parse_selector_list(selector) {
            Ok(list) => css::query_all(doc, scope, &list),
            Err(err) => {
                log::debug!(target: "dom_host", "{err}");
                Vec::new()
            }
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.doc.as_ref().is_some_and(|doc| doc.is_connected(node))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.as_ref()?.parent(node)
    }

    fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.doc.as_ref()?.next_element_sibling(node)
    }

    fn inner_html(&self, node: NodeId) -> String {
        self.doc
            .as_ref()
            .map(|doc| doc.inner_html(node))
            .unwrap_or_default()
    }

    fn set_inner_html(&mut self, node: NodeId, markup: &str) {
        if let Some(doc) = self.doc.as_mut() {
            let result = doc.set_inner_html(node, markup);
            self.write("set_inner_html", result);
        }
    }

    fn canonicalize_html(&self, markup: &str) -> String {
        Document::new().canonicalize(markup)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.doc.as_ref()?.attribute(node, name).map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&str>) {
        if let Some(doc) = self.doc.as_mut() {
            let result = match value {
                Some(value) => doc.set_attribute(node, name, value),
                None => doc.remove_attribute(node, name),
            };
            self.write("set_attribute", result);
        }
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>) {
        if let Some(doc) = self.doc.as_mut() {
            let result = doc.insert_before(parent, node, before);
            self.write("insert_before", result);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if let Some(doc) = self.doc.as_mut() {
            let result = doc.remove(node);
            self.write("remove", result);
        }
    }

    fn clone_node(&mut self, node: NodeId) -> Option<NodeId> {
        let doc = self.doc.as_mut()?;
        match doc.clone_subtree(node) {
            Ok(copy) => Some(copy),
            Err(err) => {
                log::warn!(target: "dom_host", "clone_node failed: {err}");
                None
            }
        }
    }
}

impl ChangeSource for MemoryHost {
    fn subscribe(&mut self, node: NodeId, filter: ChangeFilter) -> SubscriptionId {
        // Changes logged so far belong to the existing subscriptions only.
        self.collect();
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        log::trace!(target: "dom_host.notify", "subscribe {id:?} on {node} ({filter:?})");
        self.watches.insert(id, Watch { node, filter });
        id
    }

    fn cancel(&mut self, subscription: SubscriptionId) {
        if self.watches.shift_remove(&subscription).is_some() {
            self.queued.shift_remove(&subscription);
            log::trace!(target: "dom_host.notify", "cancel {subscription:?}");
        }
    }
}

impl FrameScheduler for MemoryHost {
    fn request_frame(&mut self) {
        self.frame_requested = true;
    }
}
