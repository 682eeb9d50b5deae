//! Cursor Tests

use crate::common::*;
use trailstore::prelude::*;

#[test]
fn one_cursor_walks_both_trails() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut cursor = Cursor::new(&store);

    cursor.bind(store.entity_index(&key(UUID1)).unwrap()).unwrap();
    assert_eq!(cursor.len(), 3);
    assert_eq!(
        drain(&mut cursor),
        events(&[(1, "a", "1"), (2, "b", "2"), (3, "c", "3")])
    );
    assert!(cursor.is_exhausted());
    assert!(cursor.next_event().unwrap().is_none());

    cursor.bind(store.entity_index(&key(UUID2)).unwrap()).unwrap();
    assert_eq!(cursor.remaining(), 4);
    assert_eq!(drain(&mut cursor).len(), 4);
}

#[test]
fn timestamps_only() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut cursor = cursor_at(&store, 0, None);
    let mut stamps = Vec::new();
    while let Some(ts) = cursor.next_timestamp().unwrap() {
        stamps.push(ts);
    }
    assert_eq!(stamps, vec![1, 2, 3, 4]);
}

#[test]
fn event_exposes_items_and_map() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut cursor = cursor_at(&store, 0, None);
    let event = cursor.next_event().unwrap().unwrap();

    assert_eq!(event.timestamp(), 1);
    assert_eq!(event.items().len(), 2);
    let field1 = store.field_id("field1").unwrap();
    let item = event.item(field1).unwrap();
    assert_eq!(store.dictionary().value(item), b"d");
    assert_eq!(event.value(field1), b"d");
    assert_eq!(event.get("time"), b"");
    assert_eq!(event.get("missing"), b"");

    let map = event.as_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map["field1"], "d");
    assert_eq!(map["field2"], "1");
    assert_eq!(event.to_string(), "1: field1=d field2=1");
}

#[test]
fn events_outlive_cursor_advance() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut cursor = cursor_at(&store, 1, None);
    let first = cursor.next_event().unwrap().unwrap();
    let second = cursor.next_event().unwrap().unwrap();
    assert_eq!(first.get_str("field1"), "a");
    assert_eq!(second.get_str("field1"), "b");
}

#[test]
fn many_cursors_over_one_store() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut a = cursor_at(&store, 0, None);
    let mut b = cursor_at(&store, 0, None);
    a.next_event().unwrap();
    a.next_event().unwrap();
    assert_eq!(b.next_timestamp().unwrap(), Some(1));
    assert_eq!(a.next_timestamp().unwrap(), Some(3));
}

#[test]
fn bind_errors() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut cursor = Cursor::new(&store);
    assert!(matches!(cursor.next_event(), Err(Error::Unbound)));
    assert!(matches!(
        cursor.bind(99),
        Err(Error::BadIndex { index: 99, count: 2 })
    ));
    assert!(cursor.trail().is_none());
}
