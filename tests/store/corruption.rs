//! Corrupt and Missing File Tests
//!
//! Every damaged file must fail to open with a corruption error; none may
//! panic or open with wrong contents.

use crate::common::*;
use trailstore::prelude::*;

fn canonical_bytes() -> (TestStore, Vec<u8>) {
    let test = TestStore::canonical();
    let bytes = std::fs::read(test.path()).unwrap();
    (test, bytes)
}

fn open_bytes(test: &TestStore, bytes: &[u8]) -> Result<Store> {
    let path = test.dir.path().join("damaged.trl");
    std::fs::write(&path, bytes).unwrap();
    Store::open(&path)
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = Store::open(dir.path().join("absent.trl")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn empty_file_is_corrupt() {
    let (test, _) = canonical_bytes();
    assert!(open_bytes(&test, &[]).unwrap_err().is_corruption());
}

#[test]
fn bad_magic_is_corrupt() {
    let (test, mut bytes) = canonical_bytes();
    bytes[0] ^= 0xFF;
    assert!(open_bytes(&test, &bytes).unwrap_err().is_corruption());
}

#[test]
fn every_truncation_is_corrupt() {
    let (test, bytes) = canonical_bytes();
    for len in 0..bytes.len() {
        let err = open_bytes(&test, &bytes[..len]).unwrap_err();
        assert!(err.is_corruption(), "truncated to {} bytes: {}", len, err);
    }
}

#[test]
fn trailing_garbage_is_corrupt() {
    let (test, mut bytes) = canonical_bytes();
    bytes.extend_from_slice(b"junk");
    assert!(open_bytes(&test, &bytes).unwrap_err().is_corruption());
}

#[test]
fn every_flipped_byte_is_detected() {
    let (test, bytes) = canonical_bytes();
    for i in 0..bytes.len() {
        let mut damaged = bytes.clone();
        damaged[i] ^= 0x01;
        let err = open_bytes(&test, &damaged).unwrap_err();
        assert!(err.is_corruption(), "flipped byte {}: {}", i, err);
    }
}

#[test]
fn strict_open_accepts_valid_store() {
    let test = TestStore::canonical();
    let store = Store::open_with(test.path(), &OpenOptions::strict()).unwrap();
    assert_eq!(store.event_count(), 7);
}

#[test]
fn unchecked_open_reads_valid_store() {
    let test = TestStore::canonical();
    let store = Store::open_with(test.path(), &OpenOptions::fast()).unwrap();
    let mut cursor = cursor_at(&store, 1, None);
    assert_eq!(drain(&mut cursor).len(), 3);
}
