//! The command vocabulary.

use crate::tables::ColumnInput;
use crate::types::{ColumnId, ColumnKind, RowId, TableId};
use crate::values::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::mem::size_of;

/// A mutable property of a column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnProperty {
    Name(String),
    Kind(ColumnKind),
    Flags(u64),
    DefaultValue(Option<Value>),
    Description(Option<String>),
    Tags(BTreeSet<String>),
}

/// A mutable property of a table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TableProperty {
    Name(String),
    Flags(u64),
    Tags(BTreeSet<String>),
}

/// One reversible datastore mutation.
///
/// Applying a command returns its exact inverse, or `None` when the command
/// does not fit the current state. Deletions only succeed on blank targets
/// (null values, zero flags, no metadata beyond what the inverse carries),
/// so the inverse recreates the target exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Write a cell addressed by row index.
    SetValue {
        table: TableId,
        row: usize,
        col: usize,
        value: Option<Value>,
    },

    /// Write a cell addressed by row id.
    SetValueById {
        table: TableId,
        row_id: RowId,
        col: usize,
        value: Option<Value>,
    },

    /// Insert a blank row. The id is allocated when absent.
    InsertEmptyRow {
        table: TableId,
        index: usize,
        row_id: Option<RowId>,
    },

    /// Delete a blank row; `row_id` must match the row at `index`.
    DeleteEmptyRow {
        table: TableId,
        index: usize,
        row_id: RowId,
    },

    /// Insert a column with a null slot in every row.
    InsertEmptyColumn {
        table: TableId,
        index: usize,
        column: ColumnInput,
    },

    /// Delete a column holding no values and no metadata beyond
    /// name/kind/flags; `column_id` must match the column at `index`.
    DeleteEmptyColumn {
        table: TableId,
        index: usize,
        column_id: ColumnId,
    },

    SetColumnProperty {
        table: TableId,
        col: usize,
        property: ColumnProperty,
    },

    SetTableProperty {
        table: TableId,
        property: TableProperty,
    },

    SetRowFlags {
        table: TableId,
        row_id: RowId,
        flags: u64,
    },

    /// Create a table, at `index` in the table list or appended.
    CreateTable {
        table: Option<TableId>,
        name: String,
        flags: u64,
        index: Option<usize>,
    },

    /// Delete a table with no rows, columns or tags.
    DeleteEmptyTable { table: TableId },
}

impl Command {
    /// The table the command targets, if it already exists.
    pub fn table(&self) -> Option<TableId> {
        match self {
            Command::SetValue { table, .. }
            | Command::SetValueById { table, .. }
            | Command::InsertEmptyRow { table, .. }
            | Command::DeleteEmptyRow { table, .. }
            | Command::InsertEmptyColumn { table, .. }
            | Command::DeleteEmptyColumn { table, .. }
            | Command::SetColumnProperty { table, .. }
            | Command::SetTableProperty { table, .. }
            | Command::SetRowFlags { table, .. }
            | Command::DeleteEmptyTable { table } => Some(*table),
            Command::CreateTable { table, .. } => *table,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetValue { .. } => "set_value",
            Command::SetValueById { .. } => "set_value_by_id",
            Command::InsertEmptyRow { .. } => "insert_empty_row",
            Command::DeleteEmptyRow { .. } => "delete_empty_row",
            Command::InsertEmptyColumn { .. } => "insert_empty_column",
            Command::DeleteEmptyColumn { .. } => "delete_empty_column",
            Command::SetColumnProperty { .. } => "set_column_property",
            Command::SetTableProperty { .. } => "set_table_property",
            Command::SetRowFlags { .. } => "set_row_flags",
            Command::CreateTable { .. } => "create_table",
            Command::DeleteEmptyTable { .. } => "delete_empty_table",
        }
    }

    /// Estimated memory held by the command, for bounding the undo history.
    pub fn estimated_size(&self) -> usize {
        let payload = match self {
            Command::SetValue { value, .. } | Command::SetValueById { value, .. } => {
                value.as_ref().map_or(0, Value::estimated_size)
            }
            Command::InsertEmptyColumn { column, .. } => column.name.capacity(),
            Command::SetColumnProperty { property, .. } => match property {
                ColumnProperty::Name(s) => s.capacity(),
                ColumnProperty::DefaultValue(v) => v.as_ref().map_or(0, Value::estimated_size),
                ColumnProperty::Description(s) => s.as_ref().map_or(0, String::capacity),
                ColumnProperty::Tags(tags) => tags_size(tags),
                ColumnProperty::Kind(_) | ColumnProperty::Flags(_) => 0,
            },
            Command::SetTableProperty { property, .. } => match property {
                TableProperty::Name(s) => s.capacity(),
                TableProperty::Tags(tags) => tags_size(tags),
                TableProperty::Flags(_) => 0,
            },
            Command::CreateTable { name, .. } => name.capacity(),
            Command::InsertEmptyRow { .. }
            | Command::DeleteEmptyRow { .. }
            | Command::DeleteEmptyColumn { .. }
            | Command::SetRowFlags { .. }
            | Command::DeleteEmptyTable { .. } => 0,
        };
        size_of::<Command>() + payload
    }
}

fn tags_size(tags: &BTreeSet<String>) -> usize {
    tags.iter().map(|t| t.capacity() + size_of::<String>()).sum()
}
