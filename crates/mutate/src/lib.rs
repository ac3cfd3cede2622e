//! Reconciliation engine for selector-driven tree mutations.
//!
//! Several independent callers register *directives* (a selector plus one
//! operator). The engine keeps one record per mutated (node, property), folds
//! every operator that targets it into a single virtual value, and writes the
//! dirty ones back in one batched flush. Change notifications from the host
//! let it tell its own writes apart from external edits, which it re-asserts
//! on top of the new baseline.

mod class_list;
mod clone;
mod config;
mod declarative;
mod directive;
mod engine;
mod fold;
mod host;
mod record;
mod registry;

pub use class_list::ClassList;
pub use clone::CloneRegistry;
pub use config::EngineConfig;
pub use declarative::{Action, Declarative};
pub use directive::{Controller, DirectiveError, Operator, Position, is_valid_attribute_name};
pub use engine::Engine;
pub use host::{ChangeFilter, ChangeSource, FrameScheduler, Host, Tree};
pub use record::{Placement, PropertyKey, PropertyRecord, PropertyValue};
pub use registry::ElementRecord;

pub use core_types::{DirectiveId, NodeId, SubscriptionId};
