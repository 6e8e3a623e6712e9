//! Tables: schema plus row storage.

use super::column::{Column, ColumnInput};
use super::rows::{Row, RowStore};
use crate::types::{ColumnId, RowId, TableId};
use crate::values::Value;
use std::collections::BTreeSet;

/// A table of the datastore.
///
/// Read access is public; every mutation goes through a command so that it
/// has a recorded inverse.
#[derive(Clone, Debug)]
pub struct Table {
    id: TableId,
    pub(crate) name: String,
    pub(crate) flags: u64,
    pub(crate) tags: BTreeSet<String>,
    columns: Vec<Column>,
    rows: RowStore,
    next_column_id: u32,
}

impl Table {
    pub(crate) fn new(id: TableId, name: String, flags: u64) -> Self {
        Self {
            id,
            name,
            flags,
            tags: BTreeSet::new(),
            columns: Vec::new(),
            rows: RowStore::default(),
            next_column_id: 1,
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> u64 {
        self.flags
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    // --- Schema ---

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Index of the column with this name, ignoring case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_index_by_id(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    // --- Rows ---

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_id(&self, index: usize) -> Option<RowId> {
        self.rows.row_id(index)
    }

    pub fn index_of(&self, id: RowId) -> Option<usize> {
        self.rows.index_of(id)
    }

    pub fn contains_row(&self, id: RowId) -> bool {
        self.rows.contains(id)
    }

    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.iter().map(|r| r.id)
    }

    /// Value at a row index and column index. `None` for null cells and for
    /// out-of-range addresses.
    pub fn value_at(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row)?.values.get(col)?.as_ref()
    }

    pub fn value_by_id(&self, id: RowId, col: usize) -> Option<&Value> {
        self.value_at(self.rows.index_of(id)?, col)
    }

    pub fn row_flags(&self, index: usize) -> Option<u64> {
        self.rows.get(index).map(|r| r.flags)
    }

    pub fn row_flags_by_id(&self, id: RowId) -> Option<u64> {
        self.row_flags(self.rows.index_of(id)?)
    }

    pub(crate) fn rows(&self) -> &RowStore {
        &self.rows
    }

    // --- Raw mutation (commands only) ---

    pub(crate) fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    /// Insert a column and its slot in every row.
    ///
    /// Refused when the index is out of range, the name is taken, or the
    /// requested id is in use.
    pub(crate) fn insert_column(&mut self, index: usize, input: &ColumnInput) -> Option<ColumnId> {
        if index > self.columns.len() || self.column_index(&input.name).is_some() {
            return None;
        }
        let id = match input.id {
            Some(id) if self.column_index_by_id(id).is_some() => return None,
            Some(id) => id,
            None => ColumnId(self.next_column_id),
        };
        if id.0 >= self.next_column_id {
            self.next_column_id = id.0 + 1;
        }
        self.columns.insert(index, Column::new(id, input));
        self.rows.insert_slot(index);
        Some(id)
    }

    /// Remove a column and its slot in every row.
    pub(crate) fn remove_column(&mut self, index: usize) -> Option<Column> {
        if index >= self.columns.len() {
            return None;
        }
        let column = self.columns.remove(index);
        self.rows.remove_slot(index);
        Some(column)
    }

    /// True if the column holds no values, so it can be removed without loss.
    pub(crate) fn column_is_empty(&self, index: usize) -> bool {
        self.rows
            .iter()
            .all(|r| r.values.get(index).map_or(true, Option::is_none))
    }

    /// Replace a cell, returning the previous value.
    pub(crate) fn replace_value(
        &mut self,
        row: usize,
        col: usize,
        value: Option<Value>,
    ) -> Option<Option<Value>> {
        let slot = self.rows.get_mut(row)?.values.get_mut(col)?;
        Some(std::mem::replace(slot, value))
    }

    pub(crate) fn replace_row_flags(&mut self, row: usize, flags: u64) -> Option<u64> {
        let r = self.rows.get_mut(row)?;
        Some(std::mem::replace(&mut r.flags, flags))
    }

    pub(crate) fn insert_row(&mut self, index: usize, id: Option<RowId>) -> Option<RowId> {
        self.rows.insert(index, id, self.columns.len())
    }

    pub(crate) fn remove_row(&mut self, index: usize) -> Option<Row> {
        self.rows.remove(index)
    }

    pub(crate) fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// True when the table has no rows, no columns and no tags.
    pub(crate) fn is_blank(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty() && self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnKind;

    fn people() -> Table {
        let mut t = Table::new(TableId(1), "people".into(), 0);
        t.insert_column(0, &ColumnInput::new("name", ColumnKind::Text)).unwrap();
        t.insert_column(1, &ColumnInput::new("age", ColumnKind::Integer64)).unwrap();
        t
    }

    #[test]
    fn test_column_names_unique_ignoring_case() {
        let mut t = people();
        assert!(t.insert_column(0, &ColumnInput::new("NAME", ColumnKind::Text)).is_none());
        assert_eq!(t.column_index("Age"), Some(1));
    }

    #[test]
    fn test_column_insert_keeps_slots_aligned() {
        let mut t = people();
        t.insert_row(0, None).unwrap();
        t.replace_value(0, 0, Some(Value::text("Alice")));
        t.replace_value(0, 1, Some(Value::Integer(30)));

        let id = t.insert_column(1, &ColumnInput::new("email", ColumnKind::Text)).unwrap();
        assert_eq!(t.column_index_by_id(id), Some(1));
        assert_eq!(t.row(0).unwrap().values.len(), 3);
        assert_eq!(t.value_at(0, 0), Some(&Value::text("Alice")));
        assert_eq!(t.value_at(0, 1), None);
        assert_eq!(t.value_at(0, 2), Some(&Value::Integer(30)));

        t.remove_column(0);
        assert_eq!(t.value_at(0, 1), Some(&Value::Integer(30)));
        assert_eq!(t.row(0).unwrap().values.len(), t.column_count());
    }

    #[test]
    fn test_column_ids_not_reused() {
        let mut t = people();
        let last = t.column(1).unwrap().id();
        t.remove_column(1);
        let new = t.insert_column(1, &ColumnInput::new("age", ColumnKind::Integer64)).unwrap();
        assert!(new > last);
    }

    #[test]
    fn test_value_by_id() {
        let mut t = people();
        let a = t.insert_row(0, None).unwrap();
        let b = t.insert_row(0, None).unwrap();
        t.replace_value(1, 0, Some(Value::text("first")));
        assert_eq!(t.value_by_id(a, 0), Some(&Value::text("first")));
        assert_eq!(t.value_by_id(b, 0), None);
        assert_eq!(t.value_at(5, 0), None);
    }
}
