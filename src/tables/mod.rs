//! Schema model and row-addressable tables.

mod column;
mod datastore;
mod rows;
mod snapshot;
mod table;

pub use column::{Column, ColumnInput};
pub use datastore::Datastore;
pub use rows::RowStore;
pub use snapshot::{DatastoreSnapshot, RowSnapshot, TableSnapshot};
pub use table::Table;
