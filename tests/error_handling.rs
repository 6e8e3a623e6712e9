//! Error handling and edge case tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tablestore::{
    ColumnInput, ColumnKind, Command, ConversionOptions, RowId, Store, StoreConfig, StoreError,
    TableId, Value,
};

fn test_store() -> Store {
    Store::new(StoreConfig::default()).unwrap()
}

fn table_with_columns(store: &mut Store) -> TableId {
    let t = store.create_table("t", None).unwrap().unwrap();
    store.add_column(t, ColumnInput::new("name", ColumnKind::Text)).unwrap();
    store.add_column(t, ColumnInput::new("n", ColumnKind::Integer64)).unwrap();
    store.create_empty_row(t, None).unwrap();
    t
}

// --- Fatal Misuse ---

#[test]
fn test_nested_transaction_rejected() {
    let mut store = test_store();
    store.start_transaction().unwrap();
    let err = store.start_transaction().unwrap_err();
    assert!(matches!(err, StoreError::TransactionAlreadyOpen));
    // The outer transaction is still usable.
    store.create_table("t", None).unwrap();
    store.end_transaction().unwrap();
    assert!(store.has_undo());
}

#[test]
fn test_history_control_rejected_in_transaction() {
    let mut store = test_store();
    store.create_table("t", None).unwrap();
    store.start_transaction().unwrap();
    assert!(matches!(store.undo(), Err(StoreError::InTransaction("undo"))));
    assert!(matches!(store.redo(), Err(StoreError::InTransaction("redo"))));
    store.rollback_transaction().unwrap();
    assert!(store.undo().unwrap());
}

#[test]
fn test_transaction_helper_refuses_nesting() {
    let mut store = test_store();
    store.start_transaction().unwrap();
    let result = store.transaction(|_| Ok(()));
    assert!(matches!(result, Err(StoreError::TransactionAlreadyOpen)));
    assert!(store.is_in_transaction());
}

// --- Soft Refusals ---

#[test]
fn test_unknown_targets_refused() {
    let mut store = test_store();
    let t = table_with_columns(&mut store);
    let missing = TableId(99);
    let before = store.history_stats();

    assert_eq!(store.add_column(missing, ColumnInput::new("x", ColumnKind::Text)).unwrap(), None);
    assert_eq!(store.insert_column(t, 7, ColumnInput::new("x", ColumnKind::Text)).unwrap(), None);
    assert_eq!(store.create_empty_row(missing, None).unwrap(), None);
    assert_eq!(store.insert_empty_row(t, 5, None).unwrap(), None);
    assert!(!store.delete_row(t, 5).unwrap());
    assert!(!store.delete_column(t, 5).unwrap());
    assert!(!store.delete_table(missing).unwrap());
    assert!(!store.set_value_at(t, 3, 0, Some(Value::text("x"))).unwrap());
    assert!(!store.set_value_by_id(t, RowId(12345), 0, None).unwrap());
    assert!(!store.set_row_flags(t, RowId(12345), 1).unwrap());
    assert!(!store.set_column_flags(t, 9, 1).unwrap());
    assert!(!store.set_table_name(missing, "x").unwrap());

    assert_eq!(store.history_stats().entries, before.entries);
}

#[test]
fn test_duplicate_column_name_refused() {
    let mut store = test_store();
    let t = table_with_columns(&mut store);
    assert_eq!(store.add_column(t, ColumnInput::new("Name", ColumnKind::Text)).unwrap(), None);
    assert!(!store.set_column_name(t, 1, "NAME").unwrap());
    assert_eq!(store.column_count(t), Some(2));
}

#[test]
fn test_unconvertible_value_refused() {
    let mut store = test_store();
    let t = table_with_columns(&mut store);
    assert!(!store.set_value_at(t, 0, 1, Some(Value::text("twelve"))).unwrap());
    assert!(!store.set_column_default_value(t, 1, Some(Value::text("twelve"))).unwrap());
    assert_eq!(store.value_at(t, 0, 1), None);

    // Null is always accepted.
    assert!(store.set_value_at(t, 0, 1, None).unwrap());
}

#[test]
fn test_strict_integers_keep_padded_codes() {
    let config = StoreConfig {
        conversion: ConversionOptions {
            strict_integers: true,
            ..ConversionOptions::default()
        },
        ..StoreConfig::default()
    };
    let mut store = Store::new(config).unwrap();
    let t = table_with_columns(&mut store);
    assert!(!store.set_value_at(t, 0, 1, Some(Value::text("007"))).unwrap());
    assert!(store.set_value_at(t, 0, 1, Some(Value::text("7"))).unwrap());
    assert_eq!(store.value_at(t, 0, 1), Some(&Value::Integer(7)));
}

#[test]
fn test_issue_refused_command_not_recorded() {
    let mut store = test_store();
    let t = table_with_columns(&mut store);
    let before = store.history_stats();
    let applied = store
        .issue(Command::DeleteEmptyTable { table: t })
        .unwrap();
    assert!(!applied);
    assert_eq!(store.history_stats().entries, before.entries);
}

#[test]
fn test_undo_redo_on_empty_history() {
    let mut store = test_store();
    assert!(!store.undo().unwrap());
    assert!(!store.redo().unwrap());
}

// --- Listeners ---

#[test]
fn test_listener_error_reaches_caller() {
    let mut store = test_store();
    store.add_undo_state_listener(|state| {
        if state.has_redo {
            Err("grid refresh failed".into())
        } else {
            Ok(())
        }
    });
    let t = store.create_table("t", None).unwrap().unwrap();

    let err = store.undo().unwrap_err();
    assert!(matches!(err, StoreError::Listener(_)));
    assert!(err.to_string().contains("grid refresh failed"));
    // The undo itself happened.
    assert!(store.table(t).is_none());
    assert!(store.has_redo());
}

#[test]
fn test_change_listener_error_reaches_caller() {
    let mut store = test_store();
    store.add_change_listener(None, |_| Err("boom".into()));
    let result = store.create_table("t", None);
    assert!(matches!(result, Err(StoreError::Listener(_))));
    assert_eq!(store.table_count(), 1);
    assert!(!store.is_in_transaction());
}

#[test]
fn test_undo_listener_fires_when_change_listener_fails() {
    let mut store = test_store();
    let flips = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&flips);
    store.add_change_listener(None, |_| Err("boom".into()));
    store.add_undo_state_listener(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let result = store.create_table("t", None);
    assert!(matches!(result, Err(StoreError::Listener(_))));
    assert!(store.has_undo());
    assert_eq!(flips.load(Ordering::SeqCst), 1);

    // The next command does not flip the pair, so no repeat.
    let _ = store.create_table("u", None);
    assert_eq!(flips.load(Ordering::SeqCst), 1);
}

// --- Configuration ---

#[test]
fn test_invalid_config_rejected() {
    let zero_buffer = StoreConfig {
        subscriber_buffer_size: 0,
        ..StoreConfig::default()
    };
    assert!(matches!(Store::new(zero_buffer), Err(StoreError::InvalidConfig(_))));

    let same_separators = StoreConfig {
        conversion: ConversionOptions {
            decimal_separator: ',',
            grouping_separator: Some(','),
            strict_integers: false,
        },
        ..StoreConfig::default()
    };
    assert!(matches!(Store::new(same_separators), Err(StoreError::InvalidConfig(_))));

    let no_headroom = StoreConfig {
        min_undo_transactions: 0,
        ..StoreConfig::default()
    };
    assert!(no_headroom.validate().is_err());
}
