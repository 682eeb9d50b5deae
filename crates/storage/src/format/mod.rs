//! On-disk byte format of a finalized store.
//!
//! This module centralizes all serialization logic for store files, keeping
//! it apart from the builder and reader that decide what to write and when.
//!
//! # Module Structure
//!
//! - `header`: fixed 64-byte header with magic, version, counts and checksum
//! - `layout`: body sections and the checksum footer
//! - `trail`: delta encoding of the events of one trail
//! - `varint`: LEB128 integers used by every variable-length section

pub mod header;
pub mod layout;
pub mod trail;
pub mod varint;

pub use header::{
    StoreHeader, FLAG_ZSTD_DATA, STORE_FOOTER_SIZE, STORE_FORMAT_VERSION, STORE_HEADER_SIZE,
    STORE_MAGIC,
};
pub use layout::{decode_store, encode_store, StoreContents, StoreImage, TrailExtent};
pub use trail::{EventReader, EventState, TrailEncoder};
