//! Multi-Cursor Merge Tests

use crate::common::*;
use trailstore::prelude::*;

fn all_cursors(store: &Store) -> Vec<Cursor<'_>> {
    (0..store.trail_count())
        .map(|trail| cursor_at(store, trail, None))
        .collect()
}

fn drain_merge(merge: &mut MultiCursor<'_>, batch_size: usize) -> Vec<(usize, u64, String)> {
    let mut out = Vec::new();
    loop {
        let batch = merge.next_batch(batch_size).unwrap();
        if batch.is_empty() {
            return out;
        }
        out.extend(
            batch
                .iter()
                .map(|m| (m.source, m.event.timestamp(), m.event.get_str("field1"))),
        );
    }
}

#[test]
fn canonical_merge_order() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut merge = MultiCursor::new(all_cursors(&store)).unwrap();
    let merged = drain_merge(&mut merge, 100);

    let order: Vec<&str> = merged.iter().map(|m| m.2.as_str()).collect();
    assert_eq!(order, vec!["d", "a", "e", "b", "f", "c", "a"]);
    let sources: Vec<usize> = merged.iter().map(|m| m.0).collect();
    assert_eq!(sources, vec![0, 1, 0, 1, 0, 1, 0]);
}

#[test]
fn batch_size_does_not_change_order() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut whole = MultiCursor::new(all_cursors(&store)).unwrap();
    let expected = drain_merge(&mut whole, 100);

    for size in 1..=7 {
        let mut merge = MultiCursor::new(all_cursors(&store)).unwrap();
        assert_eq!(drain_merge(&mut merge, size), expected, "batch size {}", size);
    }
}

#[test]
fn merge_is_time_ordered() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut merge = MultiCursor::new(all_cursors(&store)).unwrap();
    let stamps: Vec<u64> = drain_merge(&mut merge, 3).iter().map(|m| m.1).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(stamps.len(), 7);
}

#[test]
fn same_trail_twice_interleaves() {
    let test = TestStore::canonical();
    let store = test.open();
    let cursors = vec![cursor_at(&store, 1, None), cursor_at(&store, 1, None)];
    let mut merge = MultiCursor::new(cursors).unwrap();
    let sources: Vec<usize> = drain_merge(&mut merge, 10).iter().map(|m| m.0).collect();
    assert_eq!(sources, vec![0, 1, 0, 1, 0, 1]);
}

#[test]
fn filtered_sources() {
    let test = TestStore::canonical();
    let store = test.open();
    let filter = Arc::new(EventFilter::compile(
        store.dictionary(),
        &[vec![FilterTerm::eq("field1", "a")]],
    ));
    let cursors = (0..2)
        .map(|trail| cursor_at(&store, trail, Some(Arc::clone(&filter))))
        .collect();
    let mut merge = MultiCursor::new(cursors).unwrap();
    let merged = drain_merge(&mut merge, 10);
    assert_eq!(
        merged,
        vec![(1, 1, "a".to_string()), (0, 4, "a".to_string())]
    );
}

#[test]
fn reset_replays_merge() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut merge = MultiCursor::new(all_cursors(&store)).unwrap();
    let first = drain_merge(&mut merge, 2);
    merge.reset().unwrap();
    assert_eq!(drain_merge(&mut merge, 5), first);
}

#[test]
fn empty_and_unbound_inputs() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut empty = MultiCursor::new(Vec::new()).unwrap();
    assert!(empty.is_empty());
    assert!(empty.next_batch(10).unwrap().is_empty());

    let cursors = vec![cursor_at(&store, 0, None), Cursor::new(&store)];
    assert!(matches!(MultiCursor::new(cursors), Err(Error::Unbound)));
}
