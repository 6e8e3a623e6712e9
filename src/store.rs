//! Main Store struct tying all components together.

use crate::commands::{ColumnProperty, Command, TableProperty};
use crate::error::{Result, StoreError};
use crate::listeners::{
    ChangeEvent, ListenerId, ListenerRegistry, ListenerResult, SubscriptionHandle,
};
use crate::tables::{ColumnInput, Datastore, DatastoreSnapshot, Table};
use crate::types::{ColumnKind, RowId, TableId, UndoState};
use crate::undo::{History, HistoryStats};
use crate::values::{ConversionOptions, Converter, Value};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Store configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Undo history ceiling in estimated bytes.
    pub max_undo_bytes: u64,

    /// Undoable transactions trimming always keeps left of the cursor.
    pub min_undo_transactions: usize,

    /// Capacity of each undo-state subscription channel.
    pub subscriber_buffer_size: usize,

    /// Parsing rules used when coercing values to column kinds.
    pub conversion: ConversionOptions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_undo_bytes: 64 * 1024 * 1024,
            min_undo_transactions: 5,
            subscriber_buffer_size: 64,
            conversion: ConversionOptions::default(),
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.subscriber_buffer_size == 0 {
            return Err(StoreError::InvalidConfig(
                "subscriber_buffer_size must be positive".into(),
            ));
        }
        if self.min_undo_transactions == 0 {
            return Err(StoreError::InvalidConfig(
                "min_undo_transactions must be positive".into(),
            ));
        }
        if self.conversion.grouping_separator == Some(self.conversion.decimal_separator) {
            return Err(StoreError::InvalidConfig(format!(
                "decimal and grouping separators are both '{}'",
                self.conversion.decimal_separator
            )));
        }
        Ok(())
    }
}

/// The datastore with undo/redo history and notifications.
///
/// Every mutation goes through [`Store::issue`], which applies a [`Command`]
/// and records its inverse. Mutations outside an explicit transaction form a
/// transaction of their own. Listeners run once the top-level operation has
/// finished, never while a transaction is open.
///
/// Mutations return `Ok(false)` / `Ok(None)` when they do not fit the current
/// state (unknown table, index out of range, name clash, value that cannot be
/// coerced). Such refusals change nothing and are not recorded.
pub struct Store {
    config: StoreConfig,
    converter: Converter,
    datastore: Datastore,
    history: History,
    listeners: ListenerRegistry,
    /// Open transaction, if any.
    transaction: Option<u64>,
}

impl Default for Store {
    fn default() -> Self {
        Self::build(StoreConfig::default())
    }
}

impl Store {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        Self {
            converter: Converter::new(config.conversion.clone()),
            datastore: Datastore::new(),
            history: History::new(config.max_undo_bytes, config.min_undo_transactions),
            listeners: ListenerRegistry::new(config.subscriber_buffer_size),
            transaction: None,
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    // --- Queries ---

    pub fn datastore(&self) -> &Datastore {
        &self.datastore
    }

    pub fn table_count(&self) -> usize {
        self.datastore.table_count()
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.datastore.table(id)
    }

    pub fn table_at(&self, index: usize) -> Option<&Table> {
        self.datastore.table_at(index)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.datastore.table_by_name(name)
    }

    pub fn column_count(&self, table: TableId) -> Option<usize> {
        self.table(table).map(Table::column_count)
    }

    pub fn row_count(&self, table: TableId) -> Option<usize> {
        self.table(table).map(Table::row_count)
    }

    pub fn row_id(&self, table: TableId, row: usize) -> Option<RowId> {
        self.table(table)?.row_id(row)
    }

    pub fn value_at(&self, table: TableId, row: usize, col: usize) -> Option<&Value> {
        self.table(table)?.value_at(row, col)
    }

    pub fn value_by_id(&self, table: TableId, row_id: RowId, col: usize) -> Option<&Value> {
        self.table(table)?.value_by_id(row_id, col)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> DatastoreSnapshot {
        DatastoreSnapshot::capture(&self.datastore)
    }

    // --- Transactions ---

    /// Open a transaction. Commands issued until [`Store::end_transaction`]
    /// undo and redo as one step.
    pub fn start_transaction(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(StoreError::TransactionAlreadyOpen);
        }
        self.history.trim();
        let transaction = self.history.begin_transaction();
        debug!(transaction, "transaction started");
        self.transaction = Some(transaction);
        Ok(())
    }

    /// Close the open transaction and notify listeners.
    pub fn end_transaction(&mut self) -> Result<()> {
        let transaction = self.transaction.take().ok_or(StoreError::NoTransaction)?;
        debug!(transaction, "transaction ended");
        self.notify()
    }

    /// Undo every command of the open transaction and close it. The undone
    /// commands are discarded, not made redoable.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        let transaction = self.transaction.take().ok_or(StoreError::NoTransaction)?;
        debug!(transaction, "rolling back transaction");
        let result = {
            let _quiet = self.listeners.suppress();
            let ds = &mut self.datastore;
            self.history.rollback(transaction, |cmd| cmd.apply(ds))
        };
        self.notify()?;
        result
    }

    pub fn is_in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Run `f` inside a new transaction, rolling back if it returns `Err`.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        self.start_transaction()?;
        self.finish(f)
    }

    /// Like [`Store::transaction`] but joins an already open transaction.
    fn batch<T>(&mut self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        if self.transaction.is_some() {
            return f(self);
        }
        self.start_transaction()?;
        self.finish(f)
    }

    fn finish<T>(&mut self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        match f(self) {
            Ok(value) => {
                self.end_transaction()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.rollback_transaction() {
                    warn!(error = %rollback, "rollback after failed transaction also failed");
                }
                Err(e)
            }
        }
    }

    // --- Commands ---

    /// Apply a command and record its inverse. Returns whether it applied.
    ///
    /// Values are stored as given; the typed setters such as
    /// [`Store::set_value_at`] coerce them to the column kind first.
    pub fn issue(&mut self, command: Command) -> Result<bool> {
        Ok(self.execute(command)?.is_some())
    }

    /// Issue a command, returning its inverse when it applied.
    fn execute(&mut self, command: Command) -> Result<Option<Command>> {
        let implicit = self.transaction.is_none();
        if implicit {
            self.start_transaction()?;
        }
        let transaction = self.transaction.ok_or(StoreError::NoTransaction)?;

        self.history.truncate_redo();
        let inverse = command.apply(&mut self.datastore);
        if let Some(undo) = &inverse {
            self.history.push(transaction, undo.clone(), command);
        }

        if implicit {
            self.end_transaction()?;
        }
        Ok(inverse)
    }

    // --- History ---

    /// Undo the most recent transaction. Returns false if there is none.
    pub fn undo(&mut self) -> Result<bool> {
        if self.transaction.is_some() {
            return Err(StoreError::InTransaction("undo"));
        }
        let result = {
            let _quiet = self.listeners.suppress();
            let ds = &mut self.datastore;
            self.history.undo(|cmd| cmd.apply(ds))
        };
        self.notify()?;
        result
    }

    /// Redo the most recently undone transaction. Returns false if there is none.
    pub fn redo(&mut self) -> Result<bool> {
        if self.transaction.is_some() {
            return Err(StoreError::InTransaction("redo"));
        }
        let result = {
            let _quiet = self.listeners.suppress();
            let ds = &mut self.datastore;
            self.history.redo(|cmd| cmd.apply(ds))
        };
        self.notify()?;
        result
    }

    pub fn has_undo(&self) -> bool {
        self.history.has_undo()
    }

    pub fn has_redo(&self) -> bool {
        self.history.has_redo()
    }

    pub fn undo_state(&self) -> UndoState {
        UndoState {
            has_undo: self.has_undo(),
            has_redo: self.has_redo(),
        }
    }

    /// Forget all undo and redo history.
    pub fn clear_undo_buffer(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(StoreError::InTransaction("clear_undo_buffer"));
        }
        info!(entries = self.history.len(), "clearing undo history");
        self.history.clear();
        self.notify()
    }

    pub fn history_stats(&self) -> HistoryStats {
        self.history.stats()
    }

    // --- Listeners ---

    /// Register a callback for undo/redo availability changes.
    pub fn add_undo_state_listener(
        &mut self,
        listener: impl FnMut(UndoState) -> ListenerResult + Send + 'static,
    ) -> ListenerId {
        self.listeners.add_undo_listener(listener)
    }

    pub fn remove_undo_state_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove_undo_listener(id)
    }

    /// Register a callback for datastore changes, optionally limited to some
    /// tables. Table-set changes are delivered to every change listener.
    pub fn add_change_listener(
        &mut self,
        tables: Option<Vec<TableId>>,
        listener: impl FnMut(ChangeEvent) -> ListenerResult + Send + 'static,
    ) -> ListenerId {
        self.listeners.add_change_listener(tables, listener)
    }

    pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove_change_listener(id)
    }

    /// Receive undo-state changes over a bounded channel.
    pub fn subscribe_undo_state(&mut self) -> SubscriptionHandle {
        self.listeners.subscribe()
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.unsubscribe(id)
    }

    /// Deliver pending notifications once no transaction is open.
    ///
    /// The undo-state broadcast runs even when a change listener fails.
    fn notify(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Ok(());
        }
        let events = self.datastore.take_events();
        self.listeners.queue(events);
        let changes = self.listeners.fire_changes();
        let state = self.undo_state();
        let undo = self.listeners.broadcast_undo_state(state);
        changes.and(undo)
    }

    // --- Tables ---

    /// Create a table. Returns `None` if the name or id is taken.
    pub fn create_table(&mut self, name: &str, id: Option<TableId>) -> Result<Option<TableId>> {
        let command = Command::CreateTable {
            table: id,
            name: name.to_string(),
            flags: 0,
            index: None,
        };
        Ok(match self.execute(command)? {
            Some(Command::DeleteEmptyTable { table }) => Some(table),
            _ => None,
        })
    }

    /// Delete a table with all its rows and columns.
    pub fn delete_table(&mut self, id: TableId) -> Result<bool> {
        let Some(table) = self.table(id) else {
            return Ok(false);
        };
        let (rows, columns, tagged) = (table.row_count(), table.column_count(), !table.tags().is_empty());
        self.batch(|store| {
            for row in (0..rows).rev() {
                store.delete_row(id, row)?;
            }
            for col in (0..columns).rev() {
                store.delete_column(id, col)?;
            }
            if tagged {
                store.set_table_tags(id, BTreeSet::new())?;
            }
            store.issue(Command::DeleteEmptyTable { table: id })
        })
    }

    pub fn set_table_name(&mut self, id: TableId, name: &str) -> Result<bool> {
        self.issue(Command::SetTableProperty {
            table: id,
            property: TableProperty::Name(name.to_string()),
        })
    }

    pub fn set_table_flags(&mut self, id: TableId, flags: u64) -> Result<bool> {
        self.issue(Command::SetTableProperty {
            table: id,
            property: TableProperty::Flags(flags),
        })
    }

    pub fn set_table_tags(&mut self, id: TableId, tags: BTreeSet<String>) -> Result<bool> {
        self.issue(Command::SetTableProperty {
            table: id,
            property: TableProperty::Tags(tags),
        })
    }

    // --- Columns ---

    /// Append a column. Returns its index.
    pub fn add_column(&mut self, table: TableId, column: ColumnInput) -> Result<Option<usize>> {
        let Some(index) = self.column_count(table) else {
            return Ok(None);
        };
        self.insert_column(table, index, column)
    }

    /// Insert a column at `index`. Returns the index, or `None` if the table
    /// is unknown, the index is past the end, or the name or id is taken.
    pub fn insert_column(
        &mut self,
        table: TableId,
        index: usize,
        column: ColumnInput,
    ) -> Result<Option<usize>> {
        let command = Command::InsertEmptyColumn { table, index, column };
        Ok(self.execute(command)?.map(|_| index))
    }

    /// Delete a column together with its values and metadata.
    pub fn delete_column(&mut self, table: TableId, index: usize) -> Result<bool> {
        let Some(t) = self.table(table) else {
            return Ok(false);
        };
        let Some(column) = t.column(index) else {
            return Ok(false);
        };
        let column_id = column.id();
        let filled: Vec<usize> = (0..t.row_count())
            .filter(|&row| t.value_at(row, index).is_some())
            .collect();
        let mut clear = Vec::new();
        if column.default_value().is_some() {
            clear.push(ColumnProperty::DefaultValue(None));
        }
        if column.description().is_some() {
            clear.push(ColumnProperty::Description(None));
        }
        if !column.tags().is_empty() {
            clear.push(ColumnProperty::Tags(BTreeSet::new()));
        }

        self.batch(|store| {
            for row in filled {
                store.issue(Command::SetValue { table, row, col: index, value: None })?;
            }
            for property in clear {
                store.issue(Command::SetColumnProperty { table, col: index, property })?;
            }
            store.issue(Command::DeleteEmptyColumn { table, index, column_id })
        })
    }

    pub fn set_column_name(&mut self, table: TableId, col: usize, name: &str) -> Result<bool> {
        self.set_column_property(table, col, ColumnProperty::Name(name.to_string()))
    }

    pub fn set_column_flags(&mut self, table: TableId, col: usize, flags: u64) -> Result<bool> {
        self.set_column_property(table, col, ColumnProperty::Flags(flags))
    }

    /// Set the column default, coerced to the column kind.
    pub fn set_column_default_value(
        &mut self,
        table: TableId,
        col: usize,
        value: Option<Value>,
    ) -> Result<bool> {
        let Some(value) = self.coerce(table, col, value) else {
            return Ok(false);
        };
        self.set_column_property(table, col, ColumnProperty::DefaultValue(value))
    }

    pub fn set_column_description(
        &mut self,
        table: TableId,
        col: usize,
        description: Option<String>,
    ) -> Result<bool> {
        self.set_column_property(table, col, ColumnProperty::Description(description))
    }

    pub fn set_column_tags(
        &mut self,
        table: TableId,
        col: usize,
        tags: BTreeSet<String>,
    ) -> Result<bool> {
        self.set_column_property(table, col, ColumnProperty::Tags(tags))
    }

    /// Change a column's kind, converting its values and default in the same
    /// transaction. Values with no representation in the new kind become null.
    pub fn set_column_kind(&mut self, table: TableId, col: usize, kind: ColumnKind) -> Result<bool> {
        let Some(t) = self.table(table) else {
            return Ok(false);
        };
        let Some(column) = t.column(col) else {
            return Ok(false);
        };
        if column.kind() == kind {
            return Ok(false);
        }

        let converter = &self.converter;
        let convert = |value: &Value| converter.convert_value(kind, value);
        let changed: Vec<(usize, Option<Value>)> = (0..t.row_count())
            .filter_map(|row| {
                let old = t.value_at(row, col)?;
                let new = convert(old);
                (new.as_ref() != Some(old)).then_some((row, new))
            })
            .collect();
        let default = column
            .default_value()
            .map(convert)
            .filter(|new| new.as_ref() != column.default_value());

        self.batch(|store| {
            store.issue(Command::SetColumnProperty {
                table,
                col,
                property: ColumnProperty::Kind(kind),
            })?;
            for (row, value) in changed {
                store.issue(Command::SetValue { table, row, col, value })?;
            }
            if let Some(value) = default {
                store.issue(Command::SetColumnProperty {
                    table,
                    col,
                    property: ColumnProperty::DefaultValue(value),
                })?;
            }
            Ok(true)
        })
    }

    fn set_column_property(
        &mut self,
        table: TableId,
        col: usize,
        property: ColumnProperty,
    ) -> Result<bool> {
        self.issue(Command::SetColumnProperty { table, col, property })
    }

    // --- Rows ---

    /// Append a blank row. Returns its index.
    pub fn create_empty_row(&mut self, table: TableId, row_id: Option<RowId>) -> Result<Option<usize>> {
        let Some(index) = self.row_count(table) else {
            return Ok(None);
        };
        self.insert_empty_row(table, index, row_id)
    }

    /// Insert a blank row at `index`, with a fresh id unless one is given.
    ///
    /// An explicit id must not have been allocated in this table before, so
    /// deleted ids are never handed out again. Replaying a recorded
    /// [`Command::InsertEmptyRow`] through [`Store::issue`] is not limited.
    pub fn insert_empty_row(
        &mut self,
        table: TableId,
        index: usize,
        row_id: Option<RowId>,
    ) -> Result<Option<usize>> {
        if let (Some(id), Some(t)) = (row_id, self.table(table)) {
            if id < t.rows().next_id() {
                debug!(?table, ?id, "refusing previously allocated row id");
                return Ok(None);
            }
        }
        let command = Command::InsertEmptyRow { table, index, row_id };
        Ok(self.execute(command)?.map(|_| index))
    }

    /// Delete the row at `index` together with its values and flags.
    pub fn delete_row(&mut self, table: TableId, index: usize) -> Result<bool> {
        let Some(t) = self.table(table) else {
            return Ok(false);
        };
        let (Some(row_id), Some(flags)) = (t.row_id(index), t.row_flags(index)) else {
            return Ok(false);
        };
        let filled: Vec<usize> = (0..t.column_count())
            .filter(|&col| t.value_at(index, col).is_some())
            .collect();

        self.batch(|store| {
            for col in filled {
                store.issue(Command::SetValue { table, row: index, col, value: None })?;
            }
            if flags != 0 {
                store.issue(Command::SetRowFlags { table, row_id, flags: 0 })?;
            }
            store.issue(Command::DeleteEmptyRow { table, index, row_id })
        })
    }

    pub fn set_row_flags(&mut self, table: TableId, row_id: RowId, flags: u64) -> Result<bool> {
        self.issue(Command::SetRowFlags { table, row_id, flags })
    }

    // --- Values ---

    /// Write a cell by row index, coercing the value to the column kind.
    pub fn set_value_at(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        value: Option<Value>,
    ) -> Result<bool> {
        let Some(value) = self.coerce(table, col, value) else {
            return Ok(false);
        };
        self.issue(Command::SetValue { table, row, col, value })
    }

    /// Write a cell by row id, coercing the value to the column kind.
    pub fn set_value_by_id(
        &mut self,
        table: TableId,
        row_id: RowId,
        col: usize,
        value: Option<Value>,
    ) -> Result<bool> {
        let Some(value) = self.coerce(table, col, value) else {
            return Ok(false);
        };
        self.issue(Command::SetValueById { table, row_id, col, value })
    }

    /// Coerce a write to the column kind. The outer `None` is a refusal.
    fn coerce(&self, table: TableId, col: usize, value: Option<Value>) -> Option<Option<Value>> {
        let kind = self.table(table)?.column(col)?.kind();
        match value {
            None => Some(None),
            Some(v) if v.kind() == kind => Some(Some(v)),
            Some(v) => match self.converter.convert_value(kind, &v) {
                Some(converted) => Some(Some(converted)),
                None => {
                    debug!(%kind, value = ?v, "value not representable in column kind");
                    None
                }
            },
        }
    }
}
