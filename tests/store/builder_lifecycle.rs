//! Builder Lifecycle Tests
//!
//! open → add → finalize → close, and every way to misuse it.

use crate::common::*;
use trailstore::prelude::*;

// ============================================================================
// Finalize
// ============================================================================

#[test]
fn add_after_finalize_fails_and_store_stays_intact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frozen.trl");
    let mut builder = StoreBuilder::open(&path, &FIELDS).unwrap();
    builder.add_event(key(UUID1), 1, &["a", "1"]).unwrap();
    builder.finalize().unwrap();

    for _ in 0..3 {
        assert!(matches!(
            builder.add_event(key(UUID1), 2, &["b", "2"]),
            Err(Error::Finalized)
        ));
    }
    builder.close().unwrap();

    let store = Store::open(&path).unwrap();
    assert_eq!(store.event_count(), 1);
    let mut cursor = cursor_at(&store, 0, None);
    assert_eq!(drain(&mut cursor), events(&[(1, "a", "1")]));
}

#[test]
fn second_finalize_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = StoreBuilder::open(dir.path().join("twice.trl"), &FIELDS).unwrap();
    builder.finalize().unwrap();
    assert!(matches!(builder.finalize(), Err(Error::Finalized)));
}

#[test]
fn finalize_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overwrite.trl");
    std::fs::write(&path, b"stale").unwrap();

    let mut builder = StoreBuilder::open(&path, &FIELDS).unwrap();
    builder.add_event(key(UUID2), 5, &["x"]).unwrap();
    builder.finalize().unwrap();

    assert_eq!(Store::open(&path).unwrap().event_count(), 1);
}

// ============================================================================
// Abandonment
// ============================================================================

#[test]
fn abandoned_builder_leaves_no_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abandoned.trl");
    {
        let mut builder = StoreBuilder::open(&path, &FIELDS).unwrap();
        builder.add_event(key(UUID1), 1, &["a"]).unwrap();
    }
    assert!(Store::open(&path).unwrap_err().is_not_found());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn close_is_idempotent_and_blocks_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = StoreBuilder::open(dir.path().join("closed.trl"), &FIELDS).unwrap();
    builder.close().unwrap();
    builder.close().unwrap();
    assert!(matches!(
        builder.add(&[0u8; 16], 1, &["a"]),
        Err(Error::Finalized)
    ));
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn missing_trailing_values_are_empty() {
    let test = TestStore::build_with(BuilderOptions::fast(), |b| {
        b.add_event(key(UUID1), 1, &["only"]).unwrap();
        b.add_event(key(UUID1), 2, &[] as &[&str]).unwrap();
    });
    let store = test.open();
    let mut cursor = cursor_at(&store, 0, None);
    assert_eq!(drain(&mut cursor), events(&[(1, "only", ""), (2, "", "")]));
}

#[test]
fn equal_timestamps_keep_insertion_order() {
    let test = TestStore::build_with(BuilderOptions::fast(), |b| {
        b.add_event(key(UUID1), 5, &["second-batch"]).unwrap();
        b.add_event(key(UUID1), 3, &["first"]).unwrap();
        b.add_event(key(UUID1), 5, &["later"]).unwrap();
    });
    let store = test.open();
    let mut cursor = cursor_at(&store, 0, None);
    let fields: Vec<String> = drain(&mut cursor).into_iter().map(|e| e.1).collect();
    assert_eq!(fields, vec!["first", "second-batch", "later"]);
}

#[test]
fn binary_values_round_trip() {
    let raw: &[u8] = &[0, 159, 146, 150, 255];
    let test = TestStore::build_with(BuilderOptions::default(), |b| {
        b.add(key(UUID1).as_bytes(), 9, &[raw, &b"plain"[..]]).unwrap();
    });
    let store = test.open();
    let mut cursor = cursor_at(&store, 0, None);
    let event = cursor.next_event().unwrap().unwrap();
    assert_eq!(event.get("field1"), raw);
    assert_eq!(event.get("field2"), b"plain");
}

#[test]
fn bad_key_length_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = StoreBuilder::open(dir.path().join("keys.trl"), &FIELDS).unwrap();
    for len in [0, 8, 15, 17, 32] {
        let raw = vec![7u8; len];
        assert!(matches!(
            builder.add(&raw, 1, &["a"]),
            Err(Error::BadKeyLength { len: l }) if l == len
        ));
    }
    assert_eq!(builder.event_count(), 0);
}

// ============================================================================
// Append
// ============================================================================

#[test]
fn append_copies_store_mapping_fields_by_name() {
    let source = TestStore::canonical();
    let source_store = source.open();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.trl");
    let mut builder =
        StoreBuilder::open(&path, &["extra", "field2", "field1"]).unwrap();
    builder.append(&source_store).unwrap();
    builder
        .add_event(key(UUID1), 10, &["new", "10", "z"])
        .unwrap();
    let summary = builder.finalize().unwrap();
    assert_eq!(summary.event_count, 8);

    let store = Store::open(&path).unwrap();
    let trail = store.entity_index(&key(UUID1)).unwrap();
    let mut cursor = cursor_at(&store, trail, None);
    let mut seen = Vec::new();
    while let Some(event) = cursor.next_event().unwrap() {
        seen.push((
            event.timestamp(),
            event.get_str("field1"),
            event.get_str("field2"),
            event.get_str("extra"),
        ));
    }
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0], (1, "a".into(), "1".into(), "".into()));
    assert_eq!(seen[3], (10, "z".into(), "10".into(), "new".into()));
}

#[test]
fn append_rejects_unmapped_store_fields() {
    let source = TestStore::canonical();
    let source_store = source.open();

    let dir = tempfile::tempdir().unwrap();
    let mut builder = StoreBuilder::open(dir.path().join("narrow.trl"), &["field1"]).unwrap();
    assert!(matches!(builder.append(&source_store), Err(Error::Schema(_))));
    assert_eq!(builder.event_count(), 0);
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn options_from_toml_drive_the_build() {
    let options = BuilderOptions::from_toml_str(
        "sync_on_finalize = false\n[compression]\nkind = \"none\"\n",
    )
    .unwrap();
    let test = TestStore::canonical_with(options);
    let store = test.open();
    assert!(!store.is_compressed());
    assert_eq!(store.event_count(), 7);
}
