//! Arena-backed live document.
//!
//! Nodes are never freed: removing a node only detaches it, so a `NodeId`
//! held by another subsystem stays valid and can be re-inserted. Slots are
//! not reused either, so the arena only grows: every `set_inner_html`
//! allocates a fresh subtree and [`Document::len`] counts detached nodes too.
//! Every
//! observable change is appended to a mutation log that the host drains
//! after each batch of edits.
//!
//! Invariants:
//! - A node has at most one parent and appears once in that parent's children.
//! - Operations never create cycles.
//! - Only document and element nodes have children.

use crate::builder::build_fragment;
use crate::tokenizer::tokenize;
use crate::types::{Attribute, NodeKind};
use core_types::NodeId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} cannot have children")]
    InvalidParent(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0} has no text")]
    NotCharacterData(NodeId),
    #[error("inserting {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("{before} is not a child of {parent}")]
    InvalidSibling { parent: NodeId, before: NodeId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attribute(String),
    CharacterData,
}

/// One observable change.
///
/// `path` holds the target and its ancestors at the time of the change,
/// target first, so observers can match subtree scopes even after the target
/// is later moved or detached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub target: NodeId,
    pub kind: MutationKind,
    pub path: Vec<NodeId>,
}

impl Mutation {
    /// True if the change happened on `node` or inside its subtree.
    pub fn is_within(&self, node: NodeId) -> bool {
        self.path.contains(&node)
    }
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    log: Vec<Mutation>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: a document node with a single `<body>` child.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            log: Vec::new(),
        };
        doc.root = doc.alloc(NodeKind::Document);
        doc.body = doc.alloc(NodeKind::Element {
            name: "body".to_string(),
            attributes: Vec::new(),
        });
        doc.link_last_child(doc.root, doc.body);
        doc
    }

    /// A document whose body holds `markup`. The initial parse is not logged.
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::new();
        for node in doc.parse_fragment(markup) {
            doc.link_last_child(doc.body, node);
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Allocated nodes, connected or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|n| &n.kind)
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.kind(id).and_then(NodeKind::element_name)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element_name(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|s| self.is_element(*s))
    }

    /// True if `id` is reachable from the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.ancestors_inclusive(id).last() == Some(&self.root)
    }

    /// True if `node` is `ancestor` or lies inside its subtree.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    fn ancestors_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.contains_node(id).then_some(id);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.parent(current);
        }
        out
    }

    /// Element descendants of `root` in document order, `root` excluded.
    pub fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.is_element(current) {
                out.push(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, appending it if new. Always logged, even when the
    /// value is unchanged.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
        let name = name.to_ascii_lowercase();
        let attributes = self.attributes_mut(id)?;
        match attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => attributes.push((name.clone(), value.to_string())),
        }
        self.record(id, MutationKind::Attribute(name));
        Ok(())
    }

    /// Removes an attribute. Logged only if the attribute was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), TreeError> {
        let name = name.to_ascii_lowercase();
        let attributes = self.attributes_mut(id)?;
        let before = attributes.len();
        attributes.retain(|(k, _)| *k != name);
        if attributes.len() != before {
            self.record(id, MutationKind::Attribute(name));
        }
        Ok(())
    }

    fn attributes_mut(&mut self, id: NodeId) -> Result<&mut Vec<Attribute>, TreeError> {
        match self.nodes.get_mut(id.index()).map(|n| &mut n.kind) {
            Some(NodeKind::Element { attributes, .. }) => Ok(attributes),
            Some(_) => Err(TreeError::NotAnElement(id)),
            None => Err(TreeError::UnknownNode(id)),
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(text)) | Some(NodeKind::Comment(text)) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), TreeError> {
        match self.nodes.get_mut(id.index()).map(|n| &mut n.kind) {
            Some(NodeKind::Text(text)) | Some(NodeKind::Comment(text)) => {
                text.clear();
                text.push_str(value);
            }
            Some(_) => return Err(TreeError::NotCharacterData(id)),
            None => return Err(TreeError::UnknownNode(id)),
        }
        self.record(id, MutationKind::CharacterData);
        Ok(())
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` before `before` (or last when `None`),
    /// detaching it from its current parent first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), TreeError> {
        for id in [parent, child].into_iter().chain(before) {
            if !self.contains_node(id) {
                return Err(TreeError::UnknownNode(id));
            }
        }
        if !self.nodes[parent.index()].kind.allows_children() {
            return Err(TreeError::InvalidParent(parent));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(TreeError::CycleDetected { parent, child });
        }
        let mut before = before;
        if let Some(anchor) = before {
            if self.parent(anchor) != Some(parent) {
                return Err(TreeError::InvalidSibling {
                    parent,
                    before: anchor,
                });
            }
            if anchor == child {
                let siblings = self.children(parent);
                let pos = siblings.iter().position(|s| *s == child);
                before = pos.and_then(|p| siblings.get(p + 1).copied());
            }
        }

        self.detach(child);
        let siblings = &mut self.nodes[parent.index()].children;
        let pos = before
            .and_then(|anchor| siblings.iter().position(|s| *s == anchor))
            .unwrap_or(siblings.len());
        siblings.insert(pos, child);
        self.nodes[child.index()].parent = Some(parent);
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    /// Detaches `id` from its parent. Removing a detached node is a no-op.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.contains_node(id) {
            return Err(TreeError::UnknownNode(id));
        }
        self.detach(id);
        Ok(())
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.index()].parent.take() else {
            return;
        };
        self.nodes[parent.index()].children.retain(|c| *c != id);
        self.record(parent, MutationKind::ChildList);
    }

    /// Deep copy of `id` as a new detached subtree.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let kind = self.kind(id).cloned().ok_or(TreeError::UnknownNode(id))?;
        if matches!(kind, NodeKind::Document) {
            return Err(TreeError::NotAnElement(id));
        }
        let copy = self.alloc(kind);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.link_last_child(copy, child_copy);
        }
        Ok(copy)
    }

    /// Replaces the children of `id` with the parsed `markup`, logged as one
    /// child-list change. The old children are detached, not freed.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<(), TreeError> {
        match self.kind(id) {
            Some(kind) if kind.allows_children() => {}
            Some(_) => return Err(TreeError::InvalidParent(id)),
            None => return Err(TreeError::UnknownNode(id)),
        }
        let old = std::mem::take(&mut self.nodes[id.index()].children);
        for child in old {
            self.nodes[child.index()].parent = None;
        }
        for node in self.parse_fragment(markup) {
            self.link_last_child(id, node);
        }
        self.record(id, MutationKind::ChildList);
        Ok(())
    }

    /// Parses `markup` into detached nodes, returning the top-level ones.
    pub fn parse_fragment(&mut self, markup: &str) -> Vec<NodeId> {
        build_fragment(self, tokenize(markup))
    }

    /// Drains the mutation log.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.log.is_empty()
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Unlogged append used while building detached subtrees.
    pub(crate) fn link_last_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.index()].parent.is_none());
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        let path = self.ancestors_inclusive(target);
        log::trace!(target: "html.mutation", "{target} {kind:?}");
        self.log.push(Mutation { target, kind, path });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_builds_body_children_without_logging() {
        let doc = Document::parse("<h1>title</h1><p class=\"a\">x</p>");
        assert_eq!(doc.children(doc.body()).len(), 2);
        assert!(!doc.has_pending_mutations());
        assert_eq!(doc.inner_html(doc.body()), "<h1>title</h1><p class=\"a\">x</p>");
    }

    #[test]
    fn set_attribute_appends_then_replaces_and_logs() {
        let mut doc = Document::parse("<p></p>");
        let p = doc.children(doc.body())[0];
        doc.set_attribute(p, "Title", "a").unwrap();
        doc.set_attribute(p, "title", "b").unwrap();
        assert_eq!(doc.attribute(p, "title"), Some("b"));
        let log = doc.take_mutations();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, MutationKind::Attribute("title".to_string()));
        assert!(log[0].is_within(doc.body()));
    }

    #[test]
    fn remove_attribute_only_logs_when_present() {
        let mut doc = Document::parse("<p title=\"x\"></p>");
        let p = doc.children(doc.body())[0];
        doc.remove_attribute(p, "id").unwrap();
        assert!(!doc.has_pending_mutations());
        doc.remove_attribute(p, "title").unwrap();
        assert_eq!(doc.take_mutations().len(), 1);
        assert_eq!(doc.attribute(p, "title"), None);
    }

    #[test]
    fn removed_nodes_keep_their_handles() {
        let mut doc = Document::parse("<div><span>a</span></div>");
        let div = doc.children(doc.body())[0];
        let span = doc.children(div)[0];
        doc.remove(div).unwrap();
        assert!(!doc.is_connected(div));
        assert!(!doc.is_connected(span));
        assert_eq!(doc.parent(span), Some(div));
        doc.append_child(doc.body(), div).unwrap();
        assert!(doc.is_connected(span));
    }

    #[test]
    fn rewriting_content_detaches_without_reusing_slots() {
        let mut doc = Document::parse("<p>a</p>");
        let p = doc.children(doc.body())[0];
        let old_text = doc.children(p)[0];
        let before = doc.len();

        doc.set_inner_html(p, "b").unwrap();
        let new_text = doc.children(p)[0];
        assert_ne!(new_text, old_text);
        assert_eq!(doc.parent(old_text), None);
        assert_eq!(doc.text(old_text), Some("a"));
        assert_eq!(doc.len(), before + 1);
    }

    #[test]
    fn insert_before_moves_and_rejects_cycles() {
        let mut doc = Document::parse("<a></a><b></b><c></c>");
        let body = doc.body();
        let [a, b, c] = [0, 1, 2].map(|i| doc.children(body)[i]);
        doc.insert_before(body, c, Some(a)).unwrap();
        assert_eq!(doc.children(body), &[c, a, b]);
        assert_eq!(doc.next_element_sibling(c), Some(a));
        assert_eq!(
            doc.insert_before(a, body, None),
            Err(TreeError::CycleDetected {
                parent: a,
                child: body
            })
        );
        assert_eq!(
            doc.insert_before(a, b, Some(c)),
            Err(TreeError::InvalidSibling { parent: a, before: c })
        );
    }

    #[test]
    fn insert_before_self_keeps_position() {
        let mut doc = Document::parse("<a></a><b></b>");
        let body = doc.body();
        let a = doc.children(body)[0];
        doc.insert_before(body, a, Some(a)).unwrap();
        assert_eq!(doc.inner_html(body), "<a></a><b></b>");
    }

    #[test]
    fn set_inner_html_replaces_children_as_one_change() {
        let mut doc = Document::parse("<div>old<i>x</i></div>");
        let div = doc.children(doc.body())[0];
        let old_i = doc.children(div)[1];
        doc.set_inner_html(div, "new <b>bold</b>").unwrap();
        assert_eq!(doc.inner_html(div), "new <b>bold</b>");
        assert!(!doc.is_connected(old_i));
        let log = doc.take_mutations();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, MutationKind::ChildList);
        assert_eq!(log[0].target, div);
    }

    #[test]
    fn clone_subtree_is_detached_deep_copy() {
        let mut doc = Document::parse("<ul id=\"l\"><li>one</li></ul>");
        let ul = doc.children(doc.body())[0];
        let copy = doc.clone_subtree(ul).unwrap();
        assert_ne!(copy, ul);
        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.outer_html(copy), doc.outer_html(ul));
        assert!(!doc.has_pending_mutations());
    }

    #[test]
    fn descendant_elements_are_in_document_order() {
        let doc = Document::parse("<div><p>1</p><p>2</p></div><p>3</p>");
        let names: Vec<_> = doc
            .descendant_elements(doc.body())
            .into_iter()
            .map(|n| doc.outer_html(n))
            .collect();
        assert_eq!(names, vec!["<div><p>1</p><p>2</p></div>", "<p>1</p>", "<p>2</p>", "<p>3</p>"]);
    }
}
