//! In-memory host for the mutation engine.
//!
//! [`MemoryHost`] implements the engine's host traits over an
//! [`html::Document`], matching selectors with `css`. Change notifications
//! are computed from the document's mutation log and queued; [`settle`]
//! plays the role of the event loop, delivering them and running flushes
//! until the tree is quiet.

mod memory;
mod settle;
mod snapshot;

pub use memory::MemoryHost;
pub use settle::{SettleOptions, SettleReport, settle};
pub use snapshot::{diff_lines, outline};
