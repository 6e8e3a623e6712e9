//! Thread-safe handle to a store.

use crate::error::Result;
use crate::store::Store;
use parking_lot::Mutex;
use std::sync::Arc;

/// A [`Store`] behind a mutex, cloneable across threads.
///
/// The store itself is single-writer; this handle serializes access so that
/// background consumers (an autosave, a grid refreshing on undo-state
/// changes) can share it with the editing thread.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<Store>>,
}

impl SharedStore {
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run a read-only closure against the store.
    pub fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> T {
        f(&self.inner.lock())
    }

    /// Run a closure with exclusive access to the store.
    pub fn write<T>(&self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        f(&mut self.inner.lock())
    }

    /// Run a closure inside a transaction, rolled back if it returns `Err`.
    pub fn transaction<T>(&self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        self.inner.lock().transaction(f)
    }
}
