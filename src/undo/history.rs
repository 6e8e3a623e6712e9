//! Undo/redo history buffer.

use crate::commands::Command;
use crate::error::{Result, StoreError};
use std::collections::VecDeque;
use tracing::{info, warn};

/// Fixed per-entry bookkeeping cost added to the command estimates.
const ENTRY_OVERHEAD: usize = std::mem::size_of::<HistoryEntry>();

/// One recorded command: the command that undoes it and the command that
/// (re)does it, tagged with the transaction it belongs to.
#[derive(Clone, Debug)]
pub(crate) struct HistoryEntry {
    pub(crate) transaction: u64,
    pub(crate) undo: Command,
    pub(crate) redo: Command,
    size: usize,
}

impl HistoryEntry {
    fn new(transaction: u64, undo: Command, redo: Command) -> Self {
        let mut entry = Self {
            transaction,
            undo,
            redo,
            size: 0,
        };
        entry.size = entry.measure();
        entry
    }

    fn measure(&self) -> usize {
        ENTRY_OVERHEAD + self.undo.estimated_size() + self.redo.estimated_size()
    }
}

/// Counters describing the history buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub entries: usize,
    pub transactions: usize,
    pub position: usize,
    pub estimated_bytes: u64,
}

/// Ordered, front-trimmable sequence of history entries with a cursor.
///
/// Entries left of `position` are undoable, entries at and right of it are
/// redoable. Consecutive entries sharing a transaction number are undone and
/// redone as one unit.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    position: usize,
    size_bytes: usize,
    max_bytes: u64,
    min_undo_transactions: usize,
    next_transaction: u64,
}

impl History {
    pub fn new(max_bytes: u64, min_undo_transactions: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            position: 0,
            size_bytes: 0,
            max_bytes,
            min_undo_transactions,
            next_transaction: 1,
        }
    }

    pub fn has_undo(&self) -> bool {
        self.position > 0
    }

    pub fn has_redo(&self) -> bool {
        self.position < self.entries.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn estimated_bytes(&self) -> u64 {
        self.size_bytes as u64
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            entries: self.entries.len(),
            transactions: count_transactions(self.entries.iter()),
            position: self.position,
            estimated_bytes: self.estimated_bytes(),
        }
    }

    /// Allocate a transaction number.
    pub(crate) fn begin_transaction(&mut self) -> u64 {
        let n = self.next_transaction;
        self.next_transaction += 1;
        n
    }

    /// Transaction of the entry just left of the cursor.
    pub(crate) fn last_transaction(&self) -> Option<u64> {
        self.position
            .checked_sub(1)
            .map(|i| self.entries[i].transaction)
    }

    /// Transaction of the entry at the cursor.
    pub(crate) fn next_redo_transaction(&self) -> Option<u64> {
        self.entries.get(self.position).map(|e| e.transaction)
    }

    /// Drop every redoable entry.
    pub(crate) fn truncate_redo(&mut self) {
        while self.entries.len() > self.position {
            if let Some(entry) = self.entries.pop_back() {
                self.size_bytes -= entry.size;
            }
        }
    }

    /// Record an applied command at the cursor and advance past it.
    ///
    /// Any redo tail is discarded first.
    pub(crate) fn push(&mut self, transaction: u64, undo: Command, redo: Command) {
        self.truncate_redo();
        let entry = HistoryEntry::new(transaction, undo, redo);
        self.size_bytes += entry.size;
        self.entries.push_back(entry);
        self.position += 1;
    }

    /// Undo the transaction left of the cursor.
    ///
    /// `apply` executes a command and returns its inverse, which replaces the
    /// entry's redo command. Returns `Ok(false)` when there is nothing to undo.
    pub(crate) fn undo(&mut self, mut apply: impl FnMut(&Command) -> Option<Command>) -> Result<bool> {
        let Some(transaction) = self.last_transaction() else {
            return Ok(false);
        };
        while self.last_transaction() == Some(transaction) {
            let index = self.position - 1;
            match apply(&self.entries[index].undo) {
                Some(redo) => {
                    self.replace(index, |e| e.redo = redo);
                    self.position = index;
                }
                None => return Err(self.diverged("undo", index)),
            }
        }
        Ok(true)
    }

    /// Redo the transaction at the cursor. Mirror image of [`History::undo`].
    pub(crate) fn redo(&mut self, mut apply: impl FnMut(&Command) -> Option<Command>) -> Result<bool> {
        let Some(transaction) = self.next_redo_transaction() else {
            return Ok(false);
        };
        while self.next_redo_transaction() == Some(transaction) {
            let index = self.position;
            match apply(&self.entries[index].redo) {
                Some(undo) => {
                    self.replace(index, |e| e.undo = undo);
                    self.position = index + 1;
                }
                None => return Err(self.diverged("redo", index)),
            }
        }
        Ok(true)
    }

    /// Undo everything recorded under `transaction` and forget it.
    pub(crate) fn rollback(
        &mut self,
        transaction: u64,
        apply: impl FnMut(&Command) -> Option<Command>,
    ) -> Result<()> {
        if self.last_transaction() == Some(transaction) {
            self.undo(apply)?;
            self.truncate_redo();
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.position = 0;
        self.size_bytes = 0;
    }

    /// Evict whole transactions from the front once the buffer exceeds its
    /// ceiling.
    ///
    /// Eviction continues until the footprint is at most half the ceiling,
    /// fewer than two entries remain, or evicting the oldest transaction would
    /// leave fewer than `min_undo_transactions` undoable transactions.
    /// Returns the number of transactions evicted.
    pub(crate) fn trim(&mut self) -> usize {
        if self.estimated_bytes() <= self.max_bytes {
            return 0;
        }
        let target = self.max_bytes / 2;
        let mut undoable = count_transactions(self.entries.range(..self.position));
        let mut evicted = 0;

        while self.estimated_bytes() > target && self.entries.len() >= 2 {
            let Some(count) = self.first_transaction_trimmable(undoable) else {
                break;
            };
            for _ in 0..count {
                if let Some(entry) = self.entries.pop_front() {
                    self.size_bytes -= entry.size;
                }
            }
            self.position -= count;
            undoable -= 1;
            evicted += 1;
        }

        if evicted > 0 {
            info!(
                evicted,
                remaining_bytes = self.size_bytes,
                max_bytes = self.max_bytes,
                "trimmed undo history"
            );
        }
        evicted
    }

    /// Entry count of the oldest transaction, if evicting it keeps enough
    /// undoable transactions left of the cursor.
    fn first_transaction_trimmable(&self, undoable: usize) -> Option<usize> {
        let first = self.entries.front()?.transaction;
        let count = self
            .entries
            .iter()
            .take_while(|e| e.transaction == first)
            .count();
        // The oldest transaction must lie wholly left of the cursor.
        if count > self.position {
            return None;
        }
        if undoable.saturating_sub(1) < self.min_undo_transactions {
            return None;
        }
        Some(count)
    }

    fn replace(&mut self, index: usize, update: impl FnOnce(&mut HistoryEntry)) {
        let entry = &mut self.entries[index];
        let old = entry.size;
        update(entry);
        entry.size = entry.measure();
        self.size_bytes = self.size_bytes - old + entry.size;
    }

    fn diverged(&mut self, action: &str, index: usize) -> StoreError {
        let command = match action {
            "undo" => self.entries[index].undo.name(),
            _ => self.entries[index].redo.name(),
        };
        warn!(action, command, index, "stored command no longer applies; discarding history");
        self.clear();
        StoreError::HistoryDiverged(format!("{} of {} at entry {} was refused", action, command, index))
    }
}

fn count_transactions<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> usize {
    let mut count = 0;
    let mut last = None;
    for entry in entries {
        if last != Some(entry.transaction) {
            count += 1;
            last = Some(entry.transaction);
        }
    }
    count
}
