//! The datastore: an ordered collection of tables.

use super::table::Table;
use crate::listeners::ChangeEvent;
use crate::types::TableId;
use std::collections::BTreeSet;

/// In-memory datastore.
///
/// Changes made by commands are recorded as pending [`ChangeEvent`]s, which
/// the owning store drains and delivers.
#[derive(Clone, Debug)]
pub struct Datastore {
    tables: Vec<Table>,
    next_table_id: u32,
    pending: BTreeSet<ChangeEvent>,
}

impl Default for Datastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore {
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            next_table_id: 1,
            pending: BTreeSet::new(),
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_at(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id() == id)
    }

    pub fn table_index(&self, id: TableId) -> Option<usize> {
        self.tables.iter().position(|t| t.id() == id)
    }

    /// Table with this name, ignoring case.
    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub(crate) fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id() == id)
    }

    /// True if another table already uses `name`.
    pub(crate) fn name_taken(&self, name: &str, except: Option<TableId>) -> bool {
        self.tables
            .iter()
            .any(|t| Some(t.id()) != except && t.name().eq_ignore_ascii_case(name))
    }

    /// Create a table at `index` (appended when `None`).
    pub(crate) fn create_table(
        &mut self,
        name: &str,
        id: Option<TableId>,
        flags: u64,
        index: Option<usize>,
    ) -> Option<TableId> {
        let index = index.unwrap_or(self.tables.len());
        if index > self.tables.len() || self.name_taken(name, None) {
            return None;
        }
        let id = match id {
            Some(id) if self.table_index(id).is_some() => return None,
            Some(id) => id,
            None => TableId(self.next_table_id),
        };
        if id.0 >= self.next_table_id {
            self.next_table_id = id.0 + 1;
        }
        self.tables.insert(index, Table::new(id, name.to_string(), flags));
        self.record(ChangeEvent::TableSet);
        Some(id)
    }

    /// Remove a table, returning it with its former position.
    pub(crate) fn remove_table(&mut self, id: TableId) -> Option<(Table, usize)> {
        let index = self.table_index(id)?;
        let table = self.tables.remove(index);
        self.record(ChangeEvent::TableSet);
        Some((table, index))
    }

    pub(crate) fn record(&mut self, event: ChangeEvent) {
        self.pending.insert(event);
    }

    pub(crate) fn take_events(&mut self) -> BTreeSet<ChangeEvent> {
        std::mem::take(&mut self.pending)
    }
}
