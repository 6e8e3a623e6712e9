//! Integration tests for the datastore.

use std::sync::Arc;

use parking_lot::Mutex;
use tablestore::{
    flags, ChangeEvent, ColumnInput, ColumnKind, DatastoreSnapshot, RowId, SharedStore, Store,
    StoreConfig, TableId, UndoState, UndoStateEvent, Value,
};

fn test_store() -> Store {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Store::new(StoreConfig::default()).unwrap()
}

/// A table with a text and an integer column, history cleared.
fn people(store: &mut Store) -> TableId {
    let t = store.create_table("people", None).unwrap().unwrap();
    store.add_column(t, ColumnInput::new("name", ColumnKind::Text)).unwrap();
    store.add_column(t, ColumnInput::new("age", ColumnKind::Integer64)).unwrap();
    store.clear_undo_buffer().unwrap();
    t
}

fn add_person(store: &mut Store, t: TableId, name: &str, age: i64) -> usize {
    let row = store.create_empty_row(t, None).unwrap().unwrap();
    store.set_value_at(t, row, 0, Some(Value::text(name))).unwrap();
    store.set_value_at(t, row, 1, Some(Value::Integer(age))).unwrap();
    row
}

// --- Round Trip ---

#[test]
fn test_undo_all_then_redo_all() {
    let mut store = test_store();
    let t = people(&mut store);
    let start = store.snapshot();

    add_person(&mut store, t, "Alice", 30);
    add_person(&mut store, t, "Bob", 41);
    store.set_column_name(t, 1, "years").unwrap();
    store.set_column_flags(t, 0, flags::READ_ONLY).unwrap();
    store.delete_row(t, 0).unwrap();
    store.set_table_name(t, "staff").unwrap();
    let end = store.snapshot();

    let mut undone = 0;
    while store.undo().unwrap() {
        undone += 1;
    }
    assert_eq!(store.snapshot(), start);

    for _ in 0..undone {
        assert!(store.redo().unwrap());
    }
    assert_eq!(store.snapshot(), end);
    assert!(!store.redo().unwrap());
}

#[test]
fn test_new_command_discards_redo() {
    let mut store = test_store();
    let t = people(&mut store);
    add_person(&mut store, t, "Alice", 30);
    store.undo().unwrap();
    assert!(store.has_redo());

    store.create_empty_row(t, None).unwrap();
    assert!(!store.has_redo());
}

// --- Row Identity ---

#[test]
fn test_row_ids_stable_across_unrelated_edits() {
    let mut store = test_store();
    let t = people(&mut store);
    for (name, age) in [("a", 1), ("b", 2), ("c", 3)] {
        add_person(&mut store, t, name, age);
    }
    let c = store.row_id(t, 2).unwrap();

    store.insert_empty_row(t, 0, None).unwrap();
    store.delete_row(t, 1).unwrap();
    store.insert_empty_row(t, 1, None).unwrap();

    let table = store.table(t).unwrap();
    assert_eq!(table.index_of(c), Some(3));
    assert_eq!(table.value_by_id(c, 0), Some(&Value::text("c")));

    store.undo().unwrap();
    store.undo().unwrap();
    store.undo().unwrap();
    assert_eq!(store.row_id(t, 2), Some(c));
}

#[test]
fn test_row_ids_not_reused() {
    let mut store = test_store();
    let t = people(&mut store);
    store.create_empty_row(t, None).unwrap();
    let first = store.row_id(t, 0).unwrap();
    store.delete_row(t, 0).unwrap();
    store.create_empty_row(t, None).unwrap();
    assert_ne!(store.row_id(t, 0), Some(first));

    // Explicit id.
    assert_eq!(store.create_empty_row(t, Some(RowId(500))).unwrap(), Some(1));
    assert_eq!(store.row_id(t, 1), Some(RowId(500)));
    assert_eq!(store.create_empty_row(t, Some(RowId(500))).unwrap(), None);

    // A deleted id cannot be claimed back explicitly.
    assert_eq!(store.create_empty_row(t, Some(first)).unwrap(), None);
    assert_eq!(store.insert_empty_row(t, 0, Some(RowId(499))).unwrap(), None);
    assert_eq!(store.row_count(t), Some(2));
}

// --- Column Slots ---

#[test]
fn test_column_slots_stay_aligned() {
    let mut store = test_store();
    let t = people(&mut store);
    add_person(&mut store, t, "Alice", 30);
    add_person(&mut store, t, "Bob", 41);
    let age_id = store.table(t).unwrap().column(1).unwrap().id();

    store.insert_column(t, 1, ColumnInput::new("email", ColumnKind::Text)).unwrap();
    store.set_value_at(t, 0, 1, Some(Value::text("a@example.com"))).unwrap();

    let table = store.table(t).unwrap();
    assert_eq!(table.column_index_by_id(age_id), Some(2));
    assert_eq!(table.value_at(1, 2), Some(&Value::Integer(41)));
    assert_eq!(table.value_at(1, 1), None);

    store.delete_column(t, 0).unwrap();
    let table = store.table(t).unwrap();
    assert_eq!(table.column_count(), 2);
    assert_eq!(table.value_at(0, 0), Some(&Value::text("a@example.com")));
    assert_eq!(table.value_at(0, 1), Some(&Value::Integer(30)));

    for _ in 0..3 {
        store.undo().unwrap();
    }
    let table = store.table(t).unwrap();
    assert_eq!(table.column_count(), 2);
    assert_eq!(table.column(1).unwrap().id(), age_id);
    assert_eq!(table.value_at(0, 0), Some(&Value::text("Alice")));
}

// --- Notifications ---

#[test]
fn test_undo_state_notifications() {
    let mut store = test_store();
    let t = people(&mut store);
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    store.add_undo_state_listener(move |state| {
        sink.lock().push(state);
        Ok(())
    });

    add_person(&mut store, t, "Alice", 30);
    add_person(&mut store, t, "Bob", 41);
    store.undo().unwrap();
    store.undo().unwrap();
    store.redo().unwrap();

    let on = |has_undo, has_redo| UndoState { has_undo, has_redo };
    assert_eq!(*states.lock(), vec![on(true, false), on(true, true)]);
}

#[test]
fn test_subscription_receives_flips() {
    let mut store = test_store();
    let t = people(&mut store);
    let handle = store.subscribe_undo_state();

    store.create_empty_row(t, None).unwrap();
    store.undo().unwrap();

    assert_eq!(
        handle.drain(),
        vec![
            UndoStateEvent::Changed(UndoState { has_undo: true, has_redo: false }),
            UndoStateEvent::Changed(UndoState { has_undo: false, has_redo: true }),
        ]
    );
}

#[test]
fn test_change_listener_filters_tables() {
    let mut store = test_store();
    let t = people(&mut store);
    let other = store.create_table("other", None).unwrap().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    store.add_change_listener(Some(vec![other]), move |event| {
        sink.lock().push(event);
        Ok(())
    });

    add_person(&mut store, t, "Alice", 30);
    assert!(events.lock().is_empty());

    store.set_table_flags(other, flags::HIDDEN).unwrap();
    store.create_table("third", None).unwrap();
    assert_eq!(*events.lock(), vec![ChangeEvent::Schema(other), ChangeEvent::TableSet]);
}

#[test]
fn test_removed_listener_not_called() {
    let mut store = test_store();
    let t = people(&mut store);
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let id = store.add_change_listener(None, move |_| {
        *counter.lock() += 1;
        Ok(())
    });
    store.create_empty_row(t, None).unwrap();
    assert!(store.remove_change_listener(id));
    store.create_empty_row(t, None).unwrap();
    assert_eq!(*calls.lock(), 1);
}

// --- Snapshots & Sharing ---

#[test]
fn test_snapshot_json() {
    let mut store = test_store();
    let t = people(&mut store);
    add_person(&mut store, t, "Alice", 30);

    let json = store.snapshot().to_json().unwrap();
    let parsed: DatastoreSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, store.snapshot());
    assert_eq!(parsed.tables[0].rows[0].values[0], Some(Value::text("Alice")));
}

#[test]
fn test_shared_store_transaction() {
    let mut store = test_store();
    let t = people(&mut store);
    let shared = SharedStore::new(store);

    let result = shared.transaction(|s| {
        add_person(s, t, "Alice", 30);
        add_person(s, t, "Bob", 41);
        Ok(())
    });
    assert!(result.is_ok());
    assert_eq!(shared.read(|s| s.row_count(t)), Some(2));

    shared.write(|s| s.undo()).unwrap();
    assert_eq!(shared.read(|s| s.row_count(t)), Some(0));
}
