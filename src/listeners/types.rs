//! Types for store notifications.

use crate::error::ListenerError;
use crate::types::{TableId, UndoState};
use crossbeam_channel::Receiver;
use std::fmt;

/// What changed in the datastore.
///
/// Events are coalesced: a transaction touching a table's data a thousand
/// times produces one `Data` event for that table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeEvent {
    /// Tables were created, deleted or renamed.
    TableSet,
    /// Columns or table properties of a table changed.
    Schema(TableId),
    /// Rows, cells or row flags of a table changed.
    Data(TableId),
}

impl ChangeEvent {
    pub fn table(&self) -> Option<TableId> {
        match self {
            ChangeEvent::TableSet => None,
            ChangeEvent::Schema(id) | ChangeEvent::Data(id) => Some(*id),
        }
    }
}

/// Identifier returned when registering a listener or subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

/// Result a listener callback returns. Errors propagate to the caller whose
/// operation triggered the notification.
pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Event delivered to undo-state subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UndoStateEvent {
    /// Undo or redo availability flipped.
    Changed(UndoState),
    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The subscriber did not keep up with events.
    BufferOverflow,
    /// The subscriber unsubscribed.
    Unsubscribed,
}

/// Handle for receiving undo-state events.
pub struct SubscriptionHandle {
    pub id: ListenerId,
    pub(crate) receiver: Receiver<UndoStateEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<UndoStateEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<UndoStateEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<UndoStateEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every event currently queued.
    pub fn drain(&self) -> Vec<UndoStateEvent> {
        self.receiver.try_iter().collect()
    }
}
