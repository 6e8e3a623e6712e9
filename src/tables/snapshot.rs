//! Point-in-time copies of the datastore contents.

use super::column::Column;
use super::datastore::Datastore;
use super::table::Table;
use crate::error::Result;
use crate::types::{RowId, TableId};
use crate::values::Value;
use serde::{Deserialize, Serialize};

/// Schema, ids, values and flags of every table.
///
/// Id allocation counters are not part of a snapshot: undo restores
/// contents, never the counters, so ids stay unique.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatastoreSnapshot {
    pub tables: Vec<TableSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub id: TableId,
    pub name: String,
    pub flags: u64,
    pub tags: Vec<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<RowSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowSnapshot {
    pub id: RowId,
    pub flags: u64,
    pub values: Vec<Option<Value>>,
}

impl DatastoreSnapshot {
    pub fn capture(ds: &Datastore) -> Self {
        Self {
            tables: ds.tables().iter().map(TableSnapshot::capture).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl TableSnapshot {
    pub fn capture(table: &Table) -> Self {
        Self {
            id: table.id(),
            name: table.name().to_string(),
            flags: table.flags(),
            tags: table.tags().iter().cloned().collect(),
            columns: table.columns().to_vec(),
            rows: table
                .rows()
                .iter()
                .map(|r| RowSnapshot {
                    id: r.id,
                    flags: r.flags,
                    values: r.values.clone(),
                })
                .collect(),
        }
    }
}
