//! Listener registry and delivery.

use crate::error::{Result, StoreError};
use crate::types::{TableId, UndoState};
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::cell::Cell;
use std::collections::BTreeSet;
use tracing::debug;

use super::types::{
    ChangeEvent, DropReason, ListenerId, ListenerResult, SubscriptionHandle, UndoStateEvent,
};

type UndoStateCallback = Box<dyn FnMut(UndoState) -> ListenerResult + Send>;
type ChangeCallback = Box<dyn FnMut(ChangeEvent) -> ListenerResult + Send>;

struct ChangeListener {
    id: ListenerId,
    /// Tables of interest; `None` means all.
    tables: Option<BTreeSet<TableId>>,
    callback: ChangeCallback,
}

impl ChangeListener {
    fn wants(&self, event: &ChangeEvent) -> bool {
        match (&self.tables, event.table()) {
            (None, _) | (_, None) => true,
            (Some(tables), Some(id)) => tables.contains(&id),
        }
    }
}

struct Subscriber {
    id: ListenerId,
    sender: Sender<UndoStateEvent>,
}

impl Subscriber {
    /// Try to send an event. Returns false if the subscriber must be dropped.
    fn try_send(&self, event: UndoStateEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Restores delivery when dropped.
pub struct SuppressGuard<'a> {
    depth: &'a Cell<u32>,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// Holds every listener and decides when they fire.
///
/// Undo-state listeners fire only when the `(has_undo, has_redo)` pair
/// differs from the last one broadcast. Change events queue up while
/// delivery is suppressed and are delivered once, coalesced, afterwards.
pub struct ListenerRegistry {
    undo_listeners: Vec<(ListenerId, UndoStateCallback)>,
    change_listeners: Vec<ChangeListener>,
    subscribers: Vec<Subscriber>,
    subscriber_buffer: usize,
    next_id: u64,
    last_state: UndoState,
    suppressed: Cell<u32>,
    pending: BTreeSet<ChangeEvent>,
}

impl ListenerRegistry {
    pub fn new(subscriber_buffer: usize) -> Self {
        Self {
            undo_listeners: Vec::new(),
            change_listeners: Vec::new(),
            subscribers: Vec::new(),
            subscriber_buffer,
            next_id: 1,
            last_state: UndoState::default(),
            suppressed: Cell::new(0),
            pending: BTreeSet::new(),
        }
    }

    fn allocate_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    // --- Registration ---

    pub fn add_undo_listener(
        &mut self,
        callback: impl FnMut(UndoState) -> ListenerResult + Send + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.undo_listeners.push((id, Box::new(callback)));
        id
    }

    pub fn remove_undo_listener(&mut self, id: ListenerId) -> bool {
        let before = self.undo_listeners.len();
        self.undo_listeners.retain(|(lid, _)| *lid != id);
        self.undo_listeners.len() != before
    }

    pub fn add_change_listener(
        &mut self,
        tables: Option<Vec<TableId>>,
        callback: impl FnMut(ChangeEvent) -> ListenerResult + Send + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.change_listeners.push(ChangeListener {
            id,
            tables: tables.map(|t| t.into_iter().collect()),
            callback: Box::new(callback),
        });
        id
    }

    pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        let before = self.change_listeners.len();
        self.change_listeners.retain(|l| l.id != id);
        self.change_listeners.len() != before
    }

    /// Subscribe to undo-state changes over a bounded channel.
    pub fn subscribe(&mut self) -> SubscriptionHandle {
        let id = self.allocate_id();
        let (sender, receiver) = bounded(self.subscriber_buffer);
        self.subscribers.push(Subscriber { id, sender });
        SubscriptionHandle { id, receiver }
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        if let Some(pos) = self.subscribers.iter().position(|s| s.id == id) {
            let sub = self.subscribers.remove(pos);
            // Best effort.
            let _ = sub.sender.try_send(UndoStateEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.undo_listeners.len() + self.change_listeners.len()
    }

    // --- Delivery ---

    /// Suppress delivery until the returned guard is dropped.
    pub fn suppress(&self) -> SuppressGuard<'_> {
        self.suppressed.set(self.suppressed.get() + 1);
        SuppressGuard {
            depth: &self.suppressed,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get() > 0
    }

    pub fn last_undo_state(&self) -> UndoState {
        self.last_state
    }

    pub fn queue(&mut self, events: impl IntoIterator<Item = ChangeEvent>) {
        self.pending.extend(events);
    }

    /// Deliver queued change events unless suppressed.
    ///
    /// Every matching listener is called; the first error is returned.
    pub fn fire_changes(&mut self) -> Result<()> {
        if self.is_suppressed() || self.pending.is_empty() {
            return Ok(());
        }
        let events = std::mem::take(&mut self.pending);
        let mut first_err = None;
        for event in events {
            for listener in self.change_listeners.iter_mut().filter(|l| l.wants(&event)) {
                if let Err(e) = (listener.callback)(event) {
                    first_err.get_or_insert(e);
                }
            }
        }
        first_err.map_or(Ok(()), |e| Err(StoreError::Listener(e)))
    }

    /// Broadcast `state` if it differs from the last broadcast pair.
    pub fn broadcast_undo_state(&mut self, state: UndoState) -> Result<()> {
        if self.is_suppressed() || state == self.last_state {
            return Ok(());
        }
        self.last_state = state;
        debug!(has_undo = state.has_undo, has_redo = state.has_redo, "undo state changed");

        let event = UndoStateEvent::Changed(state);
        self.subscribers.retain(|sub| {
            let kept = sub.try_send(event.clone());
            if !kept {
                debug!(subscriber = ?sub.id, "dropping slow undo-state subscriber");
                let _ = sub.sender.try_send(UndoStateEvent::Dropped {
                    reason: DropReason::BufferOverflow,
                });
            }
            kept
        });

        let mut first_err = None;
        for (_, callback) in self.undo_listeners.iter_mut() {
            if let Err(e) = callback(state) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), |e| Err(StoreError::Listener(e)))
    }
}
