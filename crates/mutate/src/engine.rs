use crate::class_list::ClassList;
use crate::clone::CloneRegistry;
use crate::config::EngineConfig;
use crate::declarative::Declarative;
use crate::directive::{Controller, DirectiveError, DirectiveRegistry, Operator, Position};
use crate::fold::{fold, read_live};
use crate::host::{ChangeFilter, Host};
use crate::record::{PropertyKey, PropertyRecord, PropertyValue};
use crate::registry::{ElementRecord, NodeRegistry};
use core_types::{DirectiveId, NodeId, SubscriptionId};
use indexmap::IndexSet;
use std::collections::HashMap;

/// Who a subscription reports to.
#[derive(Clone, Debug)]
enum Subscriber {
    Watcher,
    Record { node: NodeId, key: PropertyKey },
}

/// The mutation reconciliation engine.
///
/// Owns the host and every registry. Callers register directives through the
/// `mutate_*` methods; the host's driver feeds change notifications back
/// through [`Engine::notify`] and runs [`Engine::flush`] when a frame was
/// requested.
pub struct Engine<H: Host> {
    host: H,
    config: EngineConfig,
    directives: DirectiveRegistry,
    elements: NodeRegistry,
    clones: CloneRegistry,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    watcher: Option<SubscriptionId>,
    flush_pending: bool,
}

impl<H: Host> Engine<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: H, config: EngineConfig) -> Self {
        let mut engine = Self {
            host,
            config,
            directives: DirectiveRegistry::default(),
            elements: NodeRegistry::default(),
            clones: CloneRegistry::default(),
            subscribers: HashMap::new(),
            watcher: None,
            flush_pending: false,
        };
        if config.watch_on_start {
            engine.connect();
        }
        engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Public primitives
    // ---------------------------------------------------------------------

    pub fn mutate_content(
        &mut self,
        selector: &str,
        transform: impl Fn(&str) -> String + 'static,
    ) -> Controller {
        let op = Operator::Content(Box::new(transform));
        self.register_or_noop(selector, Ok(op))
    }

    pub fn mutate_classes(
        &mut self,
        selector: &str,
        edit: impl Fn(&mut ClassList) + 'static,
    ) -> Controller {
        let op = Operator::Classes(Box::new(edit));
        self.register_or_noop(selector, Ok(op))
    }

    pub fn mutate_attribute(
        &mut self,
        selector: &str,
        name: &str,
        transform: impl Fn(Option<&str>) -> Option<String> + 'static,
    ) -> Controller {
        let op = Operator::attribute(name, Box::new(transform));
        self.register_or_noop(selector, op)
    }

    pub fn try_mutate_attribute(
        &mut self,
        selector: &str,
        name: &str,
        transform: impl Fn(Option<&str>) -> Option<String> + 'static,
    ) -> Result<Controller, DirectiveError> {
        let op = Operator::attribute(name, Box::new(transform))?;
        self.register(selector, op)
    }

    pub fn mutate_position(
        &mut self,
        selector: &str,
        producer: impl Fn() -> Position + 'static,
    ) -> Controller {
        let op = Operator::Position(Box::new(producer));
        self.register_or_noop(selector, Ok(op))
    }

    pub fn mutate_clone(&mut self, selector: &str, parent_selector: Option<&str>) -> Controller {
        let op = Operator::Mirror {
            parent_selector: parent_selector.map(str::to_string),
        };
        self.register_or_noop(selector, Ok(op))
    }

    pub fn apply_declarative(&mut self, declarative: &Declarative) -> Controller {
        let op = declarative.to_operator();
        self.register_or_noop(&declarative.selector, op)
    }

    pub fn try_apply_declarative(
        &mut self,
        declarative: &Declarative,
    ) -> Result<Controller, DirectiveError> {
        let op = declarative.to_operator()?;
        self.register(&declarative.selector, op)
    }

    /// Detaches directive `id` from every node it owns and forgets it.
    /// Unknown ids are ignored.
    pub fn revert(&mut self, id: DirectiveId) {
        let Some(directive) = self.directives.get(id) else {
            return;
        };
        let nodes: Vec<NodeId> = directive.nodes().collect();
        for node in nodes {
            self.stop_mutating(id, node);
        }
        self.directives.remove(id);
        log::debug!(target: "mutate.directive", "{id} reverted");
    }

    // ---------------------------------------------------------------------
    // Tree watcher lifecycle
    // ---------------------------------------------------------------------

    /// Starts watching the tree for structural changes and re-resolves every
    /// directive. No-op when already connected or when there is no tree.
    pub fn connect(&mut self) {
        if self.watcher.is_some() {
            return;
        }
        let Some(root) = self.host.root() else {
            return;
        };
        let subscription = self.host.subscribe(root, ChangeFilter::ChildList);
        self.subscribers.insert(subscription, Subscriber::Watcher);
        self.watcher = Some(subscription);
        log::debug!(target: "mutate.watch", "watcher connected");
        self.refresh_all();
    }

    /// Stops watching. Property records keep their own subscriptions.
    pub fn disconnect(&mut self) {
        if let Some(subscription) = self.watcher.take() {
            self.host.cancel(subscription);
            self.subscribers.remove(&subscription);
            log::debug!(target: "mutate.watch", "watcher disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.watcher.is_some()
    }

    // ---------------------------------------------------------------------
    // Re-entry points
    // ---------------------------------------------------------------------

    /// Delivers one change notification. Stale subscriptions are ignored.
    pub fn notify(&mut self, subscription: SubscriptionId) {
        match self.subscribers.get(&subscription).cloned() {
            Some(Subscriber::Watcher) => self.refresh_all(),
            Some(Subscriber::Record { node, key }) => self.on_record_change(node, key),
            None => {
                log::trace!(target: "mutate.watch", "stale subscription {subscription:?}");
            }
        }
    }

    /// Writes every dirty record to the tree, then sweeps removed mirrors.
    pub fn flush(&mut self) {
        self.flush_pending = false;
        let mut writes = 0usize;
        for node in self.elements.nodes() {
            for key in self.elements.keys(node) {
                let Some(record) = self.elements.get_mut(node, &key) else {
                    continue;
                };
                if !record.dirty {
                    continue;
                }
                record.dirty = false;
                let value = record.virtual_value.clone();
                let unclaimed = record.operators.is_empty();
                if !value.is_satisfied_by(&read_live(&self.host, &self.clones, node, &key)) {
                    self.write(node, &key, &value);
                    writes += 1;
                }
                if !unclaimed {
                    continue;
                }
                if value.is_satisfied_by(&read_live(&self.host, &self.clones, node, &key)) {
                    self.delete_record(node, &key);
                } else {
                    // Kept until the next change on the node settles it.
                    log::warn!(target: "mutate.flush", "restoring {node} {key:?} did not take effect");
                }
            }
        }
        let swept = self.clones.sweep(&mut self.host);
        log::debug!(target: "mutate.flush", "flushed {writes} value(s), swept {swept} copy(ies)");
    }

    /// Removes mirrors marked for deletion without waiting for a flush.
    pub fn cleanup(&mut self) -> usize {
        self.clones.sweep(&mut self.host)
    }

    pub fn has_pending_flush(&self) -> bool {
        self.flush_pending
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn directive_count(&self) -> usize {
        self.directives.len()
    }

    /// Nodes with at least one live property record, in handle order.
    pub fn tracked_nodes(&self) -> Vec<NodeId> {
        self.elements.nodes()
    }

    /// Live subscriptions, including the tree watcher.
    pub fn subscription_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementRecord> {
        self.elements.element(node)
    }

    pub fn record(&self, node: NodeId, key: &PropertyKey) -> Option<&PropertyRecord> {
        self.elements.get(node, key)
    }

    /// Nodes directive `id` currently contributes to.
    pub fn directive_nodes(&self, id: DirectiveId) -> Vec<NodeId> {
        self.directives
            .get(id)
            .map(|d| d.nodes().collect())
            .unwrap_or_default()
    }

    pub fn clones(&self) -> &CloneRegistry {
        &self.clones
    }

    // ---------------------------------------------------------------------
    // Directive reconciliation
    // ---------------------------------------------------------------------

    fn register_or_noop(
        &mut self,
        selector: &str,
        op: Result<Operator, DirectiveError>,
    ) -> Controller {
        match op.and_then(|op| self.register(selector, op)) {
            Ok(controller) => controller,
            Err(err) => {
                log::debug!(target: "mutate.directive", "ignoring directive for {selector:?}: {err}");
                Controller::noop()
            }
        }
    }

    fn register(&mut self, selector: &str, op: Operator) -> Result<Controller, DirectiveError> {
        if self.host.root().is_none() {
            return Err(DirectiveError::NoTree);
        }
        log::debug!(target: "mutate.directive", "registering {op:?} for {selector:?}");
        let id = self.directives.insert(selector, op);
        self.refresh_directive(id);
        Ok(Controller::new(id))
    }

    fn refresh_all(&mut self) {
        for id in self.directives.ids() {
            self.refresh_directive(id);
        }
    }

    fn refresh_directive(&mut self, id: DirectiveId) {
        let Some(root) = self.host.root() else {
            return;
        };
        let Some(directive) = self.directives.get(id) else {
            return;
        };
        let selector = directive.selector.clone();
        let owned: Vec<NodeId> = directive.nodes().collect();

        if directive.operator.is_structural() {
            if let Some(&node) = owned.first() {
                if self.host.is_connected(node) {
                    return;
                }
                log::trace!(target: "mutate.watch", "{id} lost {node}");
                self.stop_mutating(id, node);
            }
            let candidate = self
                .host
                .query_all(root, &selector)
                .into_iter()
                .find(|node| !self.clones.is_mirror(*node));
            if let Some(node) = candidate {
                self.start_mutating(id, node);
            }
            return;
        }

        let matches: IndexSet<NodeId> = self.host.query_all(root, &selector).into_iter().collect();
        for node in &matches {
            if !owned.contains(node) {
                self.start_mutating(id, *node);
            }
        }
        for node in owned {
            if !matches.contains(&node) {
                self.stop_mutating(id, node);
            }
        }
    }

    fn start_mutating(&mut self, id: DirectiveId, node: NodeId) {
        let Some(directive) = self.directives.get_mut(id) else {
            return;
        };
        directive.nodes.insert(node);
        let key = directive.operator.key();
        log::trace!(target: "mutate.directive", "{id} attached to {node}");
        self.attach(node, &key);
        if let Some(record) = self.elements.get_mut(node, &key) {
            record.add_operator(id);
        }
        self.refold(node, &key);
    }

    fn stop_mutating(&mut self, id: DirectiveId, node: NodeId) {
        let Some(directive) = self.directives.get_mut(id) else {
            return;
        };
        directive.nodes.shift_remove(&node);
        let key = directive.operator.key();
        log::trace!(target: "mutate.directive", "{id} detached from {node}");
        let Some(record) = self.elements.get_mut(node, &key) else {
            return;
        };
        record.remove_operator(id);
        self.refold(node, &key);
    }

    // ---------------------------------------------------------------------
    // Property records
    // ---------------------------------------------------------------------

    fn attach(&mut self, node: NodeId, key: &PropertyKey) {
        if self.elements.get(node, key).is_some() {
            return;
        }
        let live = read_live(&self.host, &self.clones, node, key);
        let (scope, filter) = match key {
            PropertyKey::Content => (node, ChangeFilter::Subtree),
            PropertyKey::Classes => (node, ChangeFilter::Attribute("class".to_string())),
            PropertyKey::Attribute(name) => (node, ChangeFilter::Attribute(name.clone())),
            PropertyKey::Position | PropertyKey::Mirror => {
                (self.host.root().unwrap_or(node), ChangeFilter::ChildList)
            }
        };
        let subscription = self.host.subscribe(scope, filter);
        self.subscribers.insert(
            subscription,
            Subscriber::Record {
                node,
                key: key.clone(),
            },
        );
        self.elements
            .insert(node, key.clone(), PropertyRecord::new(live, subscription));
    }

    /// Recomputes the virtual value, marks the record dirty when it differs
    /// from the tree and drops records nothing claims any more.
    fn refold(&mut self, node: NodeId, key: &PropertyKey) {
        let Some(record) = self.elements.get(node, key) else {
            return;
        };
        let unclaimed = record.operators.is_empty();
        let value = fold(&self.host, &self.directives, &self.config, node, key, record);
        let live = read_live(&self.host, &self.clones, node, key);
        // A released node that already left the tree is not put back.
        let dropped = unclaimed && *key == PropertyKey::Position && !self.host.is_connected(node);
        let dirty = !value.is_satisfied_by(&live) && !dropped;
        log::trace!(target: "mutate.fold", "{node} {key:?} -> {value:?} (dirty: {dirty})");

        let Some(record) = self.elements.get_mut(node, key) else {
            return;
        };
        record.virtual_value = value;
        record.dirty = dirty;
        if dirty {
            self.schedule_flush();
        } else if unclaimed {
            self.delete_record(node, key);
        }
    }

    fn on_record_change(&mut self, node: NodeId, key: PropertyKey) {
        // Membership of structural records is the watcher's business.
        if key.is_structural() && !self.host.is_connected(node) {
            return;
        }
        let Some(record) = self.elements.get(node, &key) else {
            return;
        };
        let live = read_live(&self.host, &self.clones, node, &key);
        if record.virtual_value.is_satisfied_by(&live) {
            return;
        }
        log::debug!(target: "mutate.watch", "external change on {node} {key:?}");
        if let Some(record) = self.elements.get_mut(node, &key) {
            record.original = live;
        }
        self.refold(node, &key);
    }

    fn delete_record(&mut self, node: NodeId, key: &PropertyKey) {
        if let Some(record) = self.elements.remove(node, key) {
            self.host.cancel(record.subscription);
            self.subscribers.remove(&record.subscription);
            log::trace!(target: "mutate.fold", "dropped record {node} {key:?}");
        }
    }

    // ---------------------------------------------------------------------
    // Write-back
    // ---------------------------------------------------------------------

    fn schedule_flush(&mut self) {
        if !self.flush_pending {
            self.flush_pending = true;
            self.host.request_frame();
        }
    }

    fn write(&mut self, node: NodeId, key: &PropertyKey, value: &PropertyValue) {
        log::trace!(target: "mutate.flush", "write {node} {key:?} = {value:?}");
        match (key, value) {
            (PropertyKey::Content, PropertyValue::Text(markup)) => {
                self.host.set_inner_html(node, markup);
            }
            (PropertyKey::Classes, PropertyValue::Text(classes)) => {
                let value = (!classes.is_empty()).then_some(classes.as_str());
                self.host.set_attribute(node, "class", value);
            }
            (PropertyKey::Attribute(name), PropertyValue::Attribute(value)) => {
                self.host.set_attribute(node, name, value.as_deref());
            }
            (PropertyKey::Position, PropertyValue::Placement(Some(placement))) => {
                self.host
                    .insert_before(placement.parent, node, placement.before);
            }
            (PropertyKey::Position, PropertyValue::Placement(None)) => self.host.remove(node),
            (PropertyKey::Mirror, PropertyValue::Mirror(true)) => match self.mirror_parent(node) {
                Ok(parent) => {
                    self.clones.ensure(&mut self.host, node, parent);
                }
                Err(selector) => {
                    log::trace!(target: "mutate.clone", "copy parent {selector:?} of {node} unresolved");
                }
            },
            (PropertyKey::Mirror, PropertyValue::Mirror(false)) => {
                self.clones.mark_for_removal(node);
            }
            (key, value) => {
                log::warn!(target: "mutate.flush", "value {value:?} does not fit {key:?}");
            }
        }
    }

    /// Parent requested by the first clone directive on `node`. `Ok(None)`
    /// places the copy next to the original; `Err` carries a selector that
    /// matched nothing.
    fn mirror_parent(&self, node: NodeId) -> Result<Option<NodeId>, String> {
        let selector = self
            .elements
            .get(node, &PropertyKey::Mirror)
            .into_iter()
            .flat_map(|record| record.operators.iter())
            .find_map(|id| match self.directives.operator(*id) {
                Some(Operator::Mirror { parent_selector }) => Some(parent_selector.clone()),
                _ => None,
            })
            .flatten();
        let Some(selector) = selector else {
            return Ok(None);
        };
        self.host
            .root()
            .and_then(|root| self.host.query_first(root, &selector))
            .map(Some)
            .ok_or(selector)
    }
}
