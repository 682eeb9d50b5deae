//! Record Decoder Tests

use crate::common::*;
use trailstore::prelude::*;

#[derive(Debug, PartialEq)]
struct Row {
    timestamp: u64,
    second: String,
    first: String,
}

impl TrailRecord for Row {
    fn field_tags() -> &'static [&'static str] {
        &["field2", "field1"]
    }

    fn from_event(timestamp: u64, values: &[Arc<str>]) -> Self {
        Row {
            timestamp,
            second: values[0].to_string(),
            first: values[1].to_string(),
        }
    }
}

struct Sparse(Vec<String>);

impl TrailRecord for Sparse {
    fn field_tags() -> &'static [&'static str] {
        &["time", "absent", "field1"]
    }

    fn from_event(_: u64, values: &[Arc<str>]) -> Self {
        Sparse(values.iter().map(|v| v.to_string()).collect())
    }
}

#[test]
fn decode_trail_in_tag_order() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut decoder = RecordDecoder::new(&store);
    let rows: Vec<Row> = decoder.decode_trail(1).unwrap();
    assert_eq!(
        rows,
        vec![
            Row { timestamp: 1, second: "1".into(), first: "a".into() },
            Row { timestamp: 2, second: "2".into(), first: "b".into() },
            Row { timestamp: 3, second: "3".into(), first: "c".into() },
        ]
    );
}

#[test]
fn time_and_unknown_tags() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut decoder = RecordDecoder::new(&store);
    let rows: Vec<Sparse> = decoder.decode_trail(0).unwrap();
    assert_eq!(rows[3].0, vec!["4", "", "a"]);
}

#[test]
fn decode_single_events_from_cursor() {
    let test = TestStore::canonical();
    let store = test.open();
    let mut decoder = RecordDecoder::new(&store);
    let mut cursor = cursor_at(&store, 0, None);
    let event = cursor.next_event().unwrap().unwrap();
    let row: Row = decoder.decode(&event);
    assert_eq!(row.first, "d");
    assert_eq!(decoder.interned_len(), 2);
}
