//! Row storage addressable by index and by stable id.

use crate::types::RowId;
use crate::values::Value;
use std::collections::HashMap;

/// A single row: its permanent id, one slot per column and a flags bitmask.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Row {
    pub(crate) id: RowId,
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) flags: u64,
}

impl Row {
    pub(crate) fn is_blank(&self) -> bool {
        self.flags == 0 && self.values.iter().all(Option::is_none)
    }
}

/// Dense row arena in index order plus an id→index side table.
///
/// The side table is updated incrementally: a structural change at index
/// `i` only touches the entries of rows at `i` and after.
#[derive(Clone, Debug)]
pub struct RowStore {
    rows: Vec<Row>,
    positions: HashMap<RowId, usize>,
    next_id: RowId,
}

impl Default for RowStore {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            positions: HashMap::new(),
            next_id: RowId(1),
        }
    }
}

impl RowStore {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_id(&self, index: usize) -> Option<RowId> {
        self.rows.get(index).map(|r| r.id)
    }

    pub fn index_of(&self, id: RowId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.positions.contains_key(&id)
    }

    /// The id the next allocated row will receive.
    pub fn next_id(&self) -> RowId {
        self.next_id
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Insert a blank row with `width` null slots.
    ///
    /// Returns `None` if the index is past the end or the requested id is
    /// already present.
    pub(crate) fn insert(&mut self, index: usize, id: Option<RowId>, width: usize) -> Option<RowId> {
        if index > self.rows.len() {
            return None;
        }
        let id = match id {
            Some(id) if self.positions.contains_key(&id) => return None,
            Some(id) => id,
            None => self.next_id,
        };
        if id >= self.next_id {
            self.next_id = id.next();
        }
        self.rows.insert(
            index,
            Row {
                id,
                values: vec![None; width],
                flags: 0,
            },
        );
        self.reindex_from(index);
        Some(id)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Row> {
        if index >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(index);
        self.positions.remove(&row.id);
        self.reindex_from(index);
        Some(row)
    }

    /// Open a null slot at `col` in every row.
    pub(crate) fn insert_slot(&mut self, col: usize) {
        for row in &mut self.rows {
            row.values.insert(col, None);
        }
    }

    /// Close the slot at `col` in every row.
    pub(crate) fn remove_slot(&mut self, col: usize) {
        for row in &mut self.rows {
            row.values.remove(col);
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (offset, row) in self.rows[start..].iter().enumerate() {
            self.positions.insert(row.id, start + offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(store: &RowStore) -> Vec<u64> {
        (0..store.len()).map(|i| store.row_id(i).unwrap().0).collect()
    }

    #[test]
    fn test_allocation_is_monotonic() {
        let mut store = RowStore::default();
        assert_eq!(store.insert(0, None, 2), Some(RowId(1)));
        assert_eq!(store.insert(1, None, 2), Some(RowId(2)));
        store.remove(1);
        assert_eq!(store.insert(1, None, 2), Some(RowId(3)));
    }

    #[test]
    fn test_explicit_id_advances_counter() {
        let mut store = RowStore::default();
        assert_eq!(store.insert(0, Some(RowId(10)), 0), Some(RowId(10)));
        assert_eq!(store.insert(0, Some(RowId(10)), 0), None);
        assert_eq!(store.insert(0, None, 0), Some(RowId(11)));
        assert_eq!(store.insert(0, Some(RowId(3)), 0), Some(RowId(3)));
        assert_eq!(store.next_id(), RowId(12));
    }

    #[test]
    fn test_mapping_follows_shifts() {
        let mut store = RowStore::default();
        for i in 0..5 {
            store.insert(i, None, 1);
        }
        store.insert(2, None, 1);
        assert_eq!(ids(&store), vec![1, 2, 6, 3, 4, 5]);
        store.remove(0);
        assert_eq!(ids(&store), vec![2, 6, 3, 4, 5]);
        for (i, id) in ids(&store).into_iter().enumerate() {
            assert_eq!(store.index_of(RowId(id)), Some(i));
        }
        assert_eq!(store.index_of(RowId(1)), None);
    }

    #[test]
    fn test_out_of_range() {
        let mut store = RowStore::default();
        assert_eq!(store.insert(1, None, 0), None);
        assert!(store.remove(0).is_none());
    }

    #[test]
    fn test_slots() {
        let mut store = RowStore::default();
        store.insert(0, None, 2);
        store.get_mut(0).unwrap().values[1] = Some(Value::Integer(7));
        store.insert_slot(1);
        assert_eq!(store.get(0).unwrap().values, vec![None, None, Some(Value::Integer(7))]);
        store.remove_slot(0);
        assert_eq!(store.get(0).unwrap().values, vec![None, Some(Value::Integer(7))]);
    }
}
