//! Live document tree for the mutation engine's in-memory host.
//!
//! - [`Document`]: arena of nodes with stable [`NodeId`] handles and a
//!   mutation log.
//! - [`tokenize`]: forgiving fragment tokenizer used by `set_inner_html`.
//! - Serialization via [`Document::inner_html`] / [`Document::outer_html`].

mod builder;
mod document;
mod entities;
mod serialize;
mod tokenizer;
mod types;

pub use crate::document::{Document, Mutation, MutationKind, TreeError};
pub use crate::tokenizer::tokenize;
pub use crate::types::{Attribute, NodeKind, Token};
pub use core_types::NodeId;
