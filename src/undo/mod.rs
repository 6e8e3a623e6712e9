//! Undo/redo history.
//!
//! The [`History`] buffer records, for every applied command, the pair of
//! commands that undo and redo it, grouped by transaction. It knows nothing
//! about the datastore: undo and redo take a closure that applies a command
//! and returns its inverse, so the freshly produced counterpart can be
//! swapped into the entry.

mod history;

pub use history::{History, HistoryStats};
