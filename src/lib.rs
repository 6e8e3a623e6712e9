//! # Tablestore
//!
//! An in-memory tabular datastore with typed columns, stable row ids and
//! transactional undo/redo.
//!
//! ## Core Concepts
//!
//! - **Values**: Seven column kinds with lenient conversion between them
//! - **Tables**: Ordered columns and rows addressable by index or by id
//! - **Commands**: Reversible mutations that return their own inverse
//! - **History**: Transactions of commands, bounded by estimated memory
//!
//! ## Example
//!
//! ```ignore
//! use tablestore::{ColumnInput, ColumnKind, Store, Value};
//!
//! let mut store = Store::default();
//! let people = store.create_table("people", None)?.unwrap();
//! store.add_column(people, ColumnInput::new("name", ColumnKind::Text))?;
//! store.add_column(people, ColumnInput::new("age", ColumnKind::Integer64))?;
//!
//! let row = store.create_empty_row(people, None)?.unwrap();
//! store.set_value_at(people, row, 0, Some(Value::text("Alice")))?;
//! store.set_value_at(people, row, 1, Some(Value::text("30")))?; // stored as 30
//!
//! store.undo()?;
//! assert!(store.has_redo());
//! ```

pub mod commands;
pub mod error;
pub mod listeners;
pub mod shared;
pub mod store;
pub mod tables;
pub mod types;
pub mod undo;
pub mod values;

// Re-exports
pub use commands::{apply_command, ColumnProperty, Command, TableProperty};
pub use error::{ListenerError, Result, StoreError};
pub use listeners::{
    ChangeEvent, DropReason, ListenerId, ListenerResult, SubscriptionHandle, UndoStateEvent,
};
pub use shared::SharedStore;
pub use store::{Store, StoreConfig};
pub use tables::{Column, ColumnInput, Datastore, DatastoreSnapshot, Table};
pub use types::*;
pub use undo::{History, HistoryStats};
pub use values::{
    compare, convert, equals, Colour, ConversionOptions, Converter, Coord, Geometry, Image,
    TimeDuration, Value,
};
