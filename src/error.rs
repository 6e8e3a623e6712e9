//! Error types for the datastore.

use thiserror::Error;

/// Boxed error returned by a failing listener.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for store operations.
///
/// Only structural misuse and listener failures are errors. A mutation that
/// cannot be applied to the current state is a soft refusal and is reported
/// through the operation's return value instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A transaction is already open")]
    TransactionAlreadyOpen,

    #[error("No transaction is open")]
    NoTransaction,

    #[error("Operation not allowed inside a transaction: {0}")]
    InTransaction(&'static str),

    #[error("Undo history diverged from the datastore: {0}")]
    HistoryDiverged(String),

    #[error("Listener failed: {0}")]
    Listener(#[source] ListenerError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
