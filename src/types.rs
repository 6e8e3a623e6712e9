//! Core types for the datastore.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a table. Never changes for the table's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId(pub u32);

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a column, unique within its table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(pub u32);

impl fmt::Debug for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Permanent row identifier, distinct from the row's positional index.
///
/// Row ids are allocated monotonically and never reused within a table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl RowId {
    pub fn next(self) -> Self {
        RowId(self.0 + 1)
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowId({})", self.0)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The value domain of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Integer64,
    Float64,
    Colour,
    Image,
    TimeDuration,
    Geometry,
}

impl ColumnKind {
    /// All kinds, in declaration order.
    pub const ALL: [ColumnKind; 7] = [
        ColumnKind::Text,
        ColumnKind::Integer64,
        ColumnKind::Float64,
        ColumnKind::Colour,
        ColumnKind::Image,
        ColumnKind::TimeDuration,
        ColumnKind::Geometry,
    ];

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer64 | ColumnKind::Float64)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer64 => "integer",
            ColumnKind::Float64 => "decimal",
            ColumnKind::Colour => "colour",
            ColumnKind::Image => "image",
            ColumnKind::TimeDuration => "time",
            ColumnKind::Geometry => "geometry",
        };
        f.write_str(name)
    }
}

/// Bitmask flags for tables, columns and rows.
///
/// The datastore stores flags verbatim; the meaning of each bit belongs to
/// the consumers. The constants below are the conventional assignments.
pub mod flags {
    /// Column or table may be absent from an input datastore.
    pub const OPTIONAL: u64 = 1 << 0;
    /// Values may not be edited from the user interface.
    pub const READ_ONLY: u64 = 1 << 1;
    /// Table accepts columns beyond its declared schema.
    pub const WILDCARD: u64 = 1 << 2;
    /// Column is a group-by key.
    pub const GROUP_BY: u64 = 1 << 3;
    /// Column is a batch key.
    pub const BATCH_KEY: u64 = 1 << 4;
    /// Column is hidden from default views.
    pub const HIDDEN: u64 = 1 << 5;
    /// Table or row was created by the user interface.
    pub const UI_CREATED: u64 = 1 << 6;
    /// Row is selected.
    pub const ROW_SELECTED: u64 = 1 << 16;
    /// Row has been modified since the flag was last cleared.
    pub const ROW_MODIFIED: u64 = 1 << 17;
}

/// Undo/redo availability pair broadcast to listeners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoState {
    pub has_undo: bool,
    pub has_redo: bool,
}
