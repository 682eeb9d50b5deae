//! Store Metadata Tests
//!
//! Counts, time range, field names and entity lookup on the canonical store.

use crate::common::*;
use trailstore::prelude::*;

#[test]
fn canonical_store_counts() {
    let test = TestStore::canonical();
    let store = test.open();
    assert_eq!(store.trail_count(), 2);
    assert_eq!(store.event_count(), 7);
    assert_eq!(store.field_count(), 3);
    assert_eq!(store.min_timestamp(), 1);
    assert_eq!(store.max_timestamp(), 4);
    assert_eq!(store.version(), 1);
    assert_eq!(store.path(), test.path());
}

#[test]
fn field_names_and_ids() {
    let test = TestStore::canonical();
    let store = test.open();
    assert_eq!(store.field_names(), &["field1".to_string(), "field2".to_string()]);
    assert_eq!(store.field_id("time").unwrap(), FieldId::TIMESTAMP);
    assert_eq!(store.field_id("field1").unwrap().as_u16(), 1);
    assert_eq!(store.field_id("field2").unwrap().as_u16(), 2);
    assert!(matches!(store.field_id("field3"), Err(Error::UnknownField(_))));
}

#[test]
fn entity_index_follows_key_order() {
    let test = TestStore::canonical();
    let store = test.open();
    assert_eq!(store.entity_index(&key(UUID2)).unwrap(), 0);
    assert_eq!(store.entity_index(&key(UUID1)).unwrap(), 1);
    assert_eq!(store.entity_key(0).unwrap(), key(UUID2));
    assert_eq!(store.entity_key(1).unwrap(), key(UUID1));
    assert_eq!(store.entity_keys(), &[key(UUID2), key(UUID1)]);

    let absent = key("ffffffffffffffffffffffffffffffff");
    assert!(store.entity_index(&absent).unwrap_err().is_not_found());
    assert!(store.entity_key(2).unwrap_err().is_not_found());
}

#[test]
fn trail_lengths() {
    let test = TestStore::canonical();
    let store = test.open();
    assert_eq!(store.trail_length(0).unwrap(), 4);
    assert_eq!(store.trail_length(1).unwrap(), 3);
    assert!(matches!(
        store.trail_length(2),
        Err(Error::BadIndex { index: 2, count: 2 })
    ));
}

#[test]
fn canonical_trails_in_time_order() {
    let test = TestStore::canonical();
    let store = test.open();

    let mut cursor = cursor_at(&store, 0, None);
    assert_eq!(
        drain(&mut cursor),
        events(&[(1, "d", "1"), (2, "e", "2"), (3, "f", "3"), (4, "a", "4")])
    );
    cursor.bind(1).unwrap();
    assert_eq!(
        drain(&mut cursor),
        events(&[(1, "a", "1"), (2, "b", "2"), (3, "c", "3")])
    );
}

#[test]
fn lexicons_hold_distinct_values() {
    let test = TestStore::canonical();
    let store = test.open();
    let dict = store.dictionary();
    let field1 = store.field_id("field1").unwrap();

    // a, b, c, d, e, f plus the empty value
    assert_eq!(dict.lexicon_len(field1), 7);
    let mut values: Vec<&[u8]> = dict.lexicon_values(field1).collect();
    values.sort();
    let expected: Vec<&[u8]> = ["a", "b", "c", "d", "e", "f"]
        .iter()
        .map(|v| v.as_bytes())
        .collect();
    assert_eq!(values, expected);

    let item = dict.item(field1, b"a").unwrap();
    assert_eq!(dict.value(item), b"a");
    assert_eq!(item.field_of(), field1);
    assert!(dict.item(field1, b"zzz").is_none());
}

#[test]
fn empty_store_opens() {
    let test = TestStore::build_with(BuilderOptions::default(), |_| {});
    let store = test.open();
    assert_eq!(store.trail_count(), 0);
    assert_eq!(store.event_count(), 0);
    assert_eq!(store.min_timestamp(), 0);
    assert_eq!(store.max_timestamp(), 0);
    assert_eq!(store.field_count(), 3);
    assert!(store.find_trails(&[] as &[(&str, &str)]).unwrap().is_empty());
}

#[test]
fn compression_presets_read_identically() {
    let plain = TestStore::canonical_with(BuilderOptions::fast());
    let packed = TestStore::canonical_with(BuilderOptions::compact());
    let (plain, packed) = (plain.open(), packed.open());
    assert!(!plain.is_compressed());

    for trail in 0..2 {
        let mut a = cursor_at(&plain, trail, None);
        let mut b = cursor_at(&packed, trail, None);
        assert_eq!(drain(&mut a), drain(&mut b));
    }
}

#[test]
fn store_is_shared_across_threads() {
    let test = TestStore::canonical();
    let store = Arc::new(test.open());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let mut cursor = Cursor::new(&store);
                cursor.bind(i % 2).unwrap();
                drain(&mut cursor).len()
            })
        })
        .collect();

    let lengths: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(lengths, vec![4, 3, 4, 3]);
}
