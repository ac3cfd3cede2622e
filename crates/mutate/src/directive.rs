//! Directives: a selector bound to one operator.

use crate::class_list::ClassList;
use crate::declarative::Action;
use crate::record::PropertyKey;
use core_types::{DirectiveId, NodeId};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("no document tree is available")]
    NoTree,
    #[error("invalid attribute name {0:?}")]
    InvalidAttributeName(String),
    #[error("unsupported action {action:?} for attribute {attribute:?}")]
    Unsupported { attribute: String, action: Action },
    #[error("position directives need a parent selector")]
    MissingParentSelector,
}

/// Target of a position operator, resolved against the tree at fold time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub parent_selector: String,
    /// Must match a child of the resolved parent.
    pub insert_before_selector: Option<String>,
}

impl Position {
    pub fn append_to(parent_selector: impl Into<String>) -> Self {
        Self {
            parent_selector: parent_selector.into(),
            insert_before_selector: None,
        }
    }

    pub fn before(mut self, selector: impl Into<String>) -> Self {
        self.insert_before_selector = Some(selector.into());
        self
    }
}

pub type ContentFn = Box<dyn Fn(&str) -> String>;
pub type ClassesFn = Box<dyn Fn(&mut ClassList)>;
pub type AttributeFn = Box<dyn Fn(Option<&str>) -> Option<String>>;
pub type PositionFn = Box<dyn Fn() -> Position>;

pub enum Operator {
    Content(ContentFn),
    Classes(ClassesFn),
    Attribute { name: String, transform: AttributeFn },
    Position(PositionFn),
    Mirror { parent_selector: Option<String> },
}

impl Operator {
    /// Builds an attribute operator, validating the name.
    ///
    /// `class` and `className` become a class-set operator that replaces the
    /// token list with whatever `transform` returns for the joined list.
    pub fn attribute(name: &str, transform: AttributeFn) -> Result<Self, DirectiveError> {
        if !is_valid_attribute_name(name) {
            return Err(DirectiveError::InvalidAttributeName(name.to_string()));
        }
        if name == "class" || name == "className" {
            return Ok(Operator::Classes(Box::new(move |classes: &mut ClassList| {
                let joined = classes.to_string();
                let next = transform(Some(&joined)).unwrap_or_default();
                classes.clear();
                for token in next.split_ascii_whitespace() {
                    classes.add(token);
                }
            })));
        }
        Ok(Operator::Attribute {
            name: name.to_string(),
            transform,
        })
    }

    pub fn key(&self) -> PropertyKey {
        match self {
            Operator::Content(_) => PropertyKey::Content,
            Operator::Classes(_) => PropertyKey::Classes,
            Operator::Attribute { name, .. } => PropertyKey::Attribute(name.clone()),
            Operator::Position(_) => PropertyKey::Position,
            Operator::Mirror { .. } => PropertyKey::Mirror,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Operator::Position(_) | Operator::Mirror { .. })
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Content(_) => f.write_str("Content(..)"),
            Operator::Classes(_) => f.write_str("Classes(..)"),
            Operator::Attribute { name, .. } => write!(f, "Attribute({name:?}, ..)"),
            Operator::Position(_) => f.write_str("Position(..)"),
            Operator::Mirror { parent_selector } => write!(f, "Mirror({parent_selector:?})"),
        }
    }
}

/// `[A-Za-z:_][A-Za-z0-9:_.-]*`
pub fn is_valid_attribute_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == b':' || first == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'.' | b'-'))
}

#[derive(Debug)]
pub(crate) struct Directive {
    pub(crate) selector: String,
    pub(crate) operator: Operator,
    /// Nodes this directive currently contributes to. Structural directives
    /// own at most one.
    pub(crate) nodes: IndexSet<NodeId>,
}

impl Directive {
    pub(crate) fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }
}

/// Live directives keyed by id, in creation order.
#[derive(Debug)]
pub(crate) struct DirectiveRegistry {
    directives: IndexMap<DirectiveId, Directive>,
    next_id: DirectiveId,
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self {
            directives: IndexMap::new(),
            next_id: DirectiveId(1),
        }
    }
}

impl DirectiveRegistry {
    pub(crate) fn insert(&mut self, selector: &str, operator: Operator) -> DirectiveId {
        let id = self.next_id;
        self.next_id = id.next();
        self.directives.insert(
            id,
            Directive {
                selector: selector.to_string(),
                operator,
                nodes: IndexSet::new(),
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: DirectiveId) -> Option<Directive> {
        self.directives.shift_remove(&id)
    }

    pub(crate) fn get(&self, id: DirectiveId) -> Option<&Directive> {
        self.directives.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: DirectiveId) -> Option<&mut Directive> {
        self.directives.get_mut(&id)
    }

    pub(crate) fn operator(&self, id: DirectiveId) -> Option<&Operator> {
        self.directives.get(&id).map(|d| &d.operator)
    }

    pub(crate) fn ids(&self) -> Vec<DirectiveId> {
        self.directives.keys().copied().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.directives.len()
    }
}

/// Handle to one registered directive.
///
/// A controller from a rejected registration is a no-op. Reverting twice is
/// harmless.
#[must_use]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Controller {
    directive: Option<DirectiveId>,
}

impl Controller {
    pub(crate) fn new(id: DirectiveId) -> Self {
        Self {
            directive: Some(id),
        }
    }

    pub fn noop() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.directive.is_none()
    }

    pub fn directive(&self) -> Option<DirectiveId> {
        self.directive
    }

    pub fn revert<H: crate::Host>(&mut self, engine: &mut crate::Engine<H>) {
        if let Some(id) = self.directive.take() {
            engine.revert(id);
        }
    }
}
