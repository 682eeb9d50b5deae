//! Fixed-size store header
//!
//! Layout (64 bytes, little-endian integer fields):
//! - `magic[4]` = `TRLS`
//! - `version: u32`
//! - `flags: u32`
//! - `field_count: u32` (including the timestamp field)
//! - `trail_count: u64`
//! - `event_count: u64`
//! - `min_timestamp: u64`
//! - `max_timestamp: u64`
//! - `body_len: u64`
//! - `header_xxh3: u64` (hash of the preceding 56 bytes)

use byteorder::{ByteOrder, LittleEndian};
use trailstore_core::{Error, Result, Timestamp};
use xxhash_rust::xxh3::xxh3_64;

/// Magic bytes opening every store file.
pub const STORE_MAGIC: [u8; 4] = *b"TRLS";

/// Current store format version.
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Size of the encoded header in bytes.
pub const STORE_HEADER_SIZE: usize = 64;

/// Size of the body checksum footer in bytes.
pub const STORE_FOOTER_SIZE: usize = 8;

const HEADER_HASH_INPUT_BYTES: usize = 56;

/// Header flag: the data section is zstd-compressed.
pub const FLAG_ZSTD_DATA: u32 = 1 << 0;

const KNOWN_FLAGS: u32 = FLAG_ZSTD_DATA;

/// Header stored at the start of each store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHeader {
    /// Format version
    pub version: u32,
    /// Feature flags (`FLAG_*`)
    pub flags: u32,
    /// Number of fields, including the timestamp field
    pub field_count: u32,
    /// Number of trails
    pub trail_count: u64,
    /// Number of events over all trails
    pub event_count: u64,
    /// Smallest timestamp in the store, 0 when empty
    pub min_timestamp: Timestamp,
    /// Largest timestamp in the store, 0 when empty
    pub max_timestamp: Timestamp,
    /// Length of the body between header and footer
    pub body_len: u64,
}

impl StoreHeader {
    /// Check whether the data section is zstd-compressed
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_ZSTD_DATA != 0
    }

    /// Encode the header to its exact on-disk representation.
    pub fn encode(&self) -> [u8; STORE_HEADER_SIZE] {
        let mut out = [0u8; STORE_HEADER_SIZE];
        out[0..4].copy_from_slice(&STORE_MAGIC);
        LittleEndian::write_u32(&mut out[4..8], self.version);
        LittleEndian::write_u32(&mut out[8..12], self.flags);
        LittleEndian::write_u32(&mut out[12..16], self.field_count);
        LittleEndian::write_u64(&mut out[16..24], self.trail_count);
        LittleEndian::write_u64(&mut out[24..32], self.event_count);
        LittleEndian::write_u64(&mut out[32..40], self.min_timestamp);
        LittleEndian::write_u64(&mut out[40..48], self.max_timestamp);
        LittleEndian::write_u64(&mut out[48..56], self.body_len);
        let checksum = xxh3_64(&out[..HEADER_HASH_INPUT_BYTES]);
        LittleEndian::write_u64(&mut out[56..64], checksum);
        out
    }

    /// Decode and validate a header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < STORE_HEADER_SIZE {
            return Err(Error::corrupt(format!(
                "header too short: expected {} bytes, got {}",
                STORE_HEADER_SIZE,
                bytes.len()
            )));
        }

        if bytes[0..4] != STORE_MAGIC {
            return Err(Error::corrupt(format!(
                "invalid magic: {:02X?}",
                &bytes[0..4]
            )));
        }

        let stored_checksum = LittleEndian::read_u64(&bytes[56..64]);
        let computed_checksum = xxh3_64(&bytes[..HEADER_HASH_INPUT_BYTES]);
        if stored_checksum != computed_checksum {
            return Err(Error::corrupt(format!(
                "header checksum mismatch: stored {:#018X}, computed {:#018X}",
                stored_checksum, computed_checksum
            )));
        }

        let version = LittleEndian::read_u32(&bytes[4..8]);
        if version != STORE_FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported format version {}, expected {}",
                version, STORE_FORMAT_VERSION
            )));
        }

        let flags = LittleEndian::read_u32(&bytes[8..12]);
        if flags & !KNOWN_FLAGS != 0 {
            return Err(Error::corrupt(format!("unknown header flags {:#x}", flags)));
        }

        let header = Self {
            version,
            flags,
            field_count: LittleEndian::read_u32(&bytes[12..16]),
            trail_count: LittleEndian::read_u64(&bytes[16..24]),
            event_count: LittleEndian::read_u64(&bytes[24..32]),
            min_timestamp: LittleEndian::read_u64(&bytes[32..40]),
            max_timestamp: LittleEndian::read_u64(&bytes[40..48]),
            body_len: LittleEndian::read_u64(&bytes[48..56]),
        };

        if header.field_count == 0 {
            return Err(Error::corrupt("field count excludes the timestamp field"));
        }
        if header.min_timestamp > header.max_timestamp {
            return Err(Error::corrupt(format!(
                "timestamp range inverted: {} > {}",
                header.min_timestamp, header.max_timestamp
            )));
        }
        Ok(header)
    }
}
