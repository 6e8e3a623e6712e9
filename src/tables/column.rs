//! Column definitions.

use crate::types::{ColumnId, ColumnKind};
use crate::values::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A column of a table.
///
/// The id is fixed for the column's lifetime; everything else is mutable
/// through commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub(crate) id: ColumnId,
    pub(crate) name: String,
    pub(crate) kind: ColumnKind,
    pub(crate) flags: u64,
    pub(crate) default_value: Option<Value>,
    pub(crate) description: Option<String>,
    pub(crate) tags: BTreeSet<String>,
}

impl Column {
    pub(crate) fn new(id: ColumnId, input: &ColumnInput) -> Self {
        Self {
            id,
            name: input.name.clone(),
            kind: input.kind,
            flags: input.flags,
            default_value: None,
            description: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn flags(&self) -> u64 {
        self.flags
    }

    pub fn has_flags(&self, flags: u64) -> bool {
        self.flags & flags == flags
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// True when only id, name, kind and flags carry information, which is
    /// what a column must look like before it can be deleted.
    pub(crate) fn is_blank(&self) -> bool {
        self.default_value.is_none() && self.description.is_none() && self.tags.is_empty()
    }
}

/// Input for creating a new column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnInput {
    /// Explicit id; allocated by the table when absent.
    pub id: Option<ColumnId>,
    pub name: String,
    pub kind: ColumnKind,
    pub flags: u64,
}

impl ColumnInput {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind,
            flags: 0,
        }
    }

    pub fn with_id(mut self, id: ColumnId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }

    /// Input that recreates `column` with its current id, name, kind and flags.
    pub(crate) fn recreate(column: &Column) -> Self {
        Self {
            id: Some(column.id),
            name: column.name.clone(),
            kind: column.kind,
            flags: column.flags,
        }
    }
}
