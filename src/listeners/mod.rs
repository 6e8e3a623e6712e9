//! Store notifications.
//!
//! Two kinds of listener are supported:
//! - undo-state listeners, called when undo or redo availability flips
//! - change listeners, called with coalesced [`ChangeEvent`]s after each
//!   top-level operation
//!
//! Undo-state changes can also be consumed from a bounded channel via
//! [`ListenerRegistry::subscribe`]; subscribers that fall behind are dropped.
//!
//! Callbacks run synchronously on the thread performing the operation. An
//! error returned by a callback propagates to that operation's caller.

mod manager;
mod types;

pub use manager::{ListenerRegistry, SuppressGuard};
pub use types::{
    ChangeEvent, DropReason, ListenerId, ListenerResult, SubscriptionHandle, UndoStateEvent,
};
