//! Command application.

use super::command::{ColumnProperty, Command, TableProperty};
use crate::listeners::ChangeEvent;
use crate::tables::{ColumnInput, Datastore};
use crate::types::TableId;
use tracing::{debug, trace};

impl Command {
    /// Apply the command and return its inverse.
    ///
    /// `None` means the command did not fit the current state and nothing
    /// changed; callers must not record it.
    pub fn apply(&self, ds: &mut Datastore) -> Option<Command> {
        let inverse = apply_command(ds, self);
        match &inverse {
            Some(_) => trace!(command = self.name(), table = ?self.table(), "applied"),
            None => debug!(command = ?self, "command refused"),
        }
        inverse
    }
}

/// Apply a command to a datastore, returning the inverse command.
pub fn apply_command(ds: &mut Datastore, command: &Command) -> Option<Command> {
    match command {
        Command::SetValue {
            table,
            row,
            col,
            value,
        } => {
            let old = ds.table_mut(*table)?.replace_value(*row, *col, value.clone())?;
            ds.record(ChangeEvent::Data(*table));
            Some(Command::SetValue {
                table: *table,
                row: *row,
                col: *col,
                value: old,
            })
        }

        Command::SetValueById {
            table,
            row_id,
            col,
            value,
        } => {
            let t = ds.table_mut(*table)?;
            let row = t.index_of(*row_id)?;
            let old = t.replace_value(row, *col, value.clone())?;
            ds.record(ChangeEvent::Data(*table));
            Some(Command::SetValueById {
                table: *table,
                row_id: *row_id,
                col: *col,
                value: old,
            })
        }

        Command::InsertEmptyRow {
            table,
            index,
            row_id,
        } => {
            let id = ds.table_mut(*table)?.insert_row(*index, *row_id)?;
            ds.record(ChangeEvent::Data(*table));
            Some(Command::DeleteEmptyRow {
                table: *table,
                index: *index,
                row_id: id,
            })
        }

        Command::DeleteEmptyRow {
            table,
            index,
            row_id,
        } => {
            let t = ds.table_mut(*table)?;
            let row = t.row(*index)?;
            if row.id != *row_id || !row.is_blank() {
                return None;
            }
            t.remove_row(*index)?;
            ds.record(ChangeEvent::Data(*table));
            Some(Command::InsertEmptyRow {
                table: *table,
                index: *index,
                row_id: Some(*row_id),
            })
        }

        Command::InsertEmptyColumn {
            table,
            index,
            column,
        } => {
            let id = ds.table_mut(*table)?.insert_column(*index, column)?;
            ds.record(ChangeEvent::Schema(*table));
            Some(Command::DeleteEmptyColumn {
                table: *table,
                index: *index,
                column_id: id,
            })
        }

        Command::DeleteEmptyColumn {
            table,
            index,
            column_id,
        } => {
            let t = ds.table_mut(*table)?;
            let column = t.column(*index)?;
            if column.id() != *column_id || !column.is_blank() || !t.column_is_empty(*index) {
                return None;
            }
            let removed = t.remove_column(*index)?;
            ds.record(ChangeEvent::Schema(*table));
            Some(Command::InsertEmptyColumn {
                table: *table,
                index: *index,
                column: ColumnInput::recreate(&removed),
            })
        }

        Command::SetColumnProperty {
            table,
            col,
            property,
        } => {
            let old = set_column_property(ds, *table, *col, property)?;
            ds.record(ChangeEvent::Schema(*table));
            Some(Command::SetColumnProperty {
                table: *table,
                col: *col,
                property: old,
            })
        }

        Command::SetTableProperty { table, property } => {
            let old = set_table_property(ds, *table, property)?;
            ds.record(ChangeEvent::Schema(*table));
            if matches!(property, TableProperty::Name(_)) {
                ds.record(ChangeEvent::TableSet);
            }
            Some(Command::SetTableProperty {
                table: *table,
                property: old,
            })
        }

        Command::SetRowFlags {
            table,
            row_id,
            flags,
        } => {
            let t = ds.table_mut(*table)?;
            let row = t.index_of(*row_id)?;
            let old = t.replace_row_flags(row, *flags)?;
            ds.record(ChangeEvent::Data(*table));
            Some(Command::SetRowFlags {
                table: *table,
                row_id: *row_id,
                flags: old,
            })
        }

        Command::CreateTable {
            table,
            name,
            flags,
            index,
        } => {
            let id = ds.create_table(name, *table, *flags, *index)?;
            Some(Command::DeleteEmptyTable { table: id })
        }

        Command::DeleteEmptyTable { table } => {
            if !ds.table(*table)?.is_blank() {
                return None;
            }
            let (removed, index) = ds.remove_table(*table)?;
            Some(Command::CreateTable {
                table: Some(removed.id()),
                name: removed.name,
                flags: removed.flags,
                index: Some(index),
            })
        }
    }
}

fn set_column_property(
    ds: &mut Datastore,
    table: TableId,
    col: usize,
    property: &ColumnProperty,
) -> Option<ColumnProperty> {
    let t = ds.table_mut(table)?;
    if let ColumnProperty::Name(name) = property {
        if matches!(t.column_index(name), Some(i) if i != col) {
            return None;
        }
    }

    let column = t.column_mut(col)?;
    let old = match property.clone() {
        ColumnProperty::Name(name) => ColumnProperty::Name(std::mem::replace(&mut column.name, name)),
        ColumnProperty::Kind(kind) => ColumnProperty::Kind(std::mem::replace(&mut column.kind, kind)),
        ColumnProperty::Flags(flags) => {
            ColumnProperty::Flags(std::mem::replace(&mut column.flags, flags))
        }
        ColumnProperty::DefaultValue(v) => {
            ColumnProperty::DefaultValue(std::mem::replace(&mut column.default_value, v))
        }
        ColumnProperty::Description(d) => {
            ColumnProperty::Description(std::mem::replace(&mut column.description, d))
        }
        ColumnProperty::Tags(tags) => ColumnProperty::Tags(std::mem::replace(&mut column.tags, tags)),
    };
    Some(old)
}

fn set_table_property(
    ds: &mut Datastore,
    table: TableId,
    property: &TableProperty,
) -> Option<TableProperty> {
    if let TableProperty::Name(name) = property {
        if ds.name_taken(name, Some(table)) {
            return None;
        }
    }
    let t = ds.table_mut(table)?;
    let old = match property.clone() {
        TableProperty::Name(name) => TableProperty::Name(std::mem::replace(&mut t.name, name)),
        TableProperty::Flags(flags) => TableProperty::Flags(std::mem::replace(&mut t.flags, flags)),
        TableProperty::Tags(tags) => TableProperty::Tags(std::mem::replace(&mut t.tags, tags)),
    };
    Some(old)
}
