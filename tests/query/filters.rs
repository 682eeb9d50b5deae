//! Event Filter Tests
//!
//! A filter is an OR of clauses, each an AND of terms.

use crate::common::*;
use trailstore::prelude::*;

fn filtered(store: &Store, trail: u64, clauses: &[Vec<FilterTerm>]) -> Vec<(u64, String, String)> {
    let filter = Arc::new(EventFilter::compile(store.dictionary(), clauses));
    let mut cursor = cursor_at(store, trail, Some(filter));
    drain(&mut cursor)
}

// ============================================================================
// Conjunction
// ============================================================================

#[test]
fn single_term() {
    let test = TestStore::canonical();
    let store = test.open();
    let clauses = [vec![FilterTerm::eq("field1", "a")]];
    assert_eq!(filtered(&store, 0, &clauses), events(&[(4, "a", "4")]));
    assert_eq!(filtered(&store, 1, &clauses), events(&[(1, "a", "1")]));
}

#[test]
fn conjunction_requires_every_term() {
    let test = TestStore::canonical();
    let store = test.open();
    let miss = [vec![FilterTerm::eq("field1", "a"), FilterTerm::eq("field2", "3")]];
    assert!(filtered(&store, 0, &miss).is_empty());

    let hit = [vec![FilterTerm::eq("field1", "a"), FilterTerm::eq("field2", "4")]];
    assert_eq!(filtered(&store, 0, &hit), events(&[(4, "a", "4")]));
}

// ============================================================================
// Disjunction
// ============================================================================

#[test]
fn disjunction_accepts_any_clause() {
    let test = TestStore::canonical();
    let store = test.open();
    let clauses = [
        vec![FilterTerm::eq("field1", "e")],
        vec![FilterTerm::eq("field2", "2")],
    ];
    assert_eq!(filtered(&store, 0, &clauses), events(&[(2, "e", "2")]));
    assert_eq!(filtered(&store, 1, &clauses), events(&[(2, "b", "2")]));
}

#[test]
fn disjunction_of_negations() {
    let test = TestStore::canonical();
    let store = test.open();
    let clauses = [
        vec![FilterTerm::ne("field1", "e")],
        vec![FilterTerm::ne("field2", "4")],
    ];
    assert_eq!(filtered(&store, 0, &clauses).len(), 4);

    let both = [vec![FilterTerm::ne("field1", "e"), FilterTerm::ne("field2", "4")]];
    assert_eq!(
        filtered(&store, 0, &both),
        events(&[(1, "d", "1"), (3, "f", "3")])
    );
}

// ============================================================================
// Unresolvable Terms
// ============================================================================

#[test]
fn unknown_value_matches_nothing() {
    let test = TestStore::canonical();
    let store = test.open();
    let clauses = [vec![FilterTerm::eq("field1", "zzz")]];
    assert!(filtered(&store, 0, &clauses).is_empty());
    assert!(filtered(&store, 1, &clauses).is_empty());
}

#[test]
fn unknown_field_negation_matches_everything() {
    let test = TestStore::canonical();
    let store = test.open();
    let clauses = [vec![FilterTerm::ne("nope", "x")]];
    assert_eq!(filtered(&store, 1, &clauses).len(), 3);
}

// ============================================================================
// Attachment
// ============================================================================

#[test]
fn filter_shared_between_cursors() {
    let test = TestStore::canonical();
    let store = test.open();
    let filter = Arc::new(EventFilter::compile(
        store.dictionary(),
        &[vec![FilterTerm::ne("field2", "1")]],
    ));
    let mut a = cursor_at(&store, 0, Some(Arc::clone(&filter)));
    let mut b = cursor_at(&store, 1, Some(Arc::clone(&filter)));
    assert_eq!(drain(&mut a).len(), 3);
    assert_eq!(drain(&mut b).len(), 2);
    assert_eq!(Arc::strong_count(&filter), 3);
}

#[test]
fn filter_survives_rebind() {
    let test = TestStore::canonical();
    let store = test.open();
    let filter = Arc::new(EventFilter::compile(
        store.dictionary(),
        &[vec![FilterTerm::eq("field1", "a")]],
    ));
    let mut cursor = cursor_at(&store, 0, Some(filter));
    assert_eq!(drain(&mut cursor).len(), 1);
    cursor.bind(1).unwrap();
    assert_eq!(drain(&mut cursor), events(&[(1, "a", "1")]));

    cursor.unset_filter();
    cursor.bind(1).unwrap();
    assert_eq!(drain(&mut cursor).len(), 3);
}
