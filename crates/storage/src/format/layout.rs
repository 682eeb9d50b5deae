//! Whole-file layout
//!
//! ```text
//! header   (64 bytes, see `header`)
//! body
//!   field names   varint count, count × (varint len, utf8)
//!   lexicons      per user field: varint count, count × (varint len, bytes)
//!   keys          trail_count × 16 bytes, ascending
//!   toc           per trail: varint event count, varint encoded length
//!   data          varint raw length, varint stored length, stored bytes
//! footer   (xxh3_64 of the body, u64 LE)
//! ```
//!
//! Lexicons omit the empty value, which is implicitly index 0 of every field.

use super::header::{
    StoreHeader, FLAG_ZSTD_DATA, STORE_FOOTER_SIZE, STORE_FORMAT_VERSION, STORE_HEADER_SIZE,
};
use super::varint::{decode_varint, encode_varint};
use crate::config::Compression;
use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;
use trailstore_core::{
    Dictionary, EntityKey, Error, FieldId, Result, Timestamp, ENTITY_KEY_LEN,
};
use xxhash_rust::xxh3::xxh3_64;

/// Location of one trail inside the data section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailExtent {
    /// Number of events in the trail
    pub events: u64,
    /// Encoded length in bytes
    pub len: u64,
}

/// Everything needed to write a store file
#[derive(Debug)]
pub struct StoreContents<'a> {
    /// Field names and lexicons
    pub dictionary: &'a Dictionary,
    /// Entity keys, ascending, one per trail
    pub keys: &'a [EntityKey],
    /// One extent per trail, in key order
    pub extents: &'a [TrailExtent],
    /// Concatenated encoded trails
    pub data: &'a [u8],
    /// Total number of events
    pub event_count: u64,
    /// Smallest timestamp, 0 when empty
    pub min_timestamp: Timestamp,
    /// Largest timestamp, 0 when empty
    pub max_timestamp: Timestamp,
}

/// A decoded store file
#[derive(Debug)]
pub struct StoreImage {
    /// Validated header
    pub header: StoreHeader,
    /// Rebuilt dictionary
    pub dictionary: Dictionary,
    /// Entity keys, ascending
    pub keys: Vec<EntityKey>,
    /// One extent per trail
    pub extents: Vec<TrailExtent>,
    /// Decompressed data section
    pub data: Vec<u8>,
}

// ============================================================================
// Encoding
// ============================================================================

fn put_bytes(value: &[u8], out: &mut Vec<u8>) {
    encode_varint(value.len() as u64, out);
    out.extend_from_slice(value);
}

/// Serialize a complete store file.
pub fn encode_store(contents: &StoreContents<'_>, compression: Compression) -> Result<Vec<u8>> {
    if contents.keys.len() != contents.extents.len() {
        return Err(Error::Encoding(format!(
            "{} keys for {} trails",
            contents.keys.len(),
            contents.extents.len()
        )));
    }

    let dictionary = contents.dictionary;
    let mut body = Vec::with_capacity(contents.data.len() + contents.keys.len() * 20);

    encode_varint(dictionary.user_field_count() as u64, &mut body);
    for name in dictionary.field_names() {
        put_bytes(name.as_bytes(), &mut body);
    }

    for index in 0..dictionary.user_field_count() {
        let field = FieldId::for_user_index(index);
        let count = dictionary.lexicon_len(field).saturating_sub(1);
        encode_varint(count as u64, &mut body);
        for value in dictionary.lexicon_values(field) {
            put_bytes(value, &mut body);
        }
    }
    let dictionary_len = body.len();

    for key in contents.keys {
        body.extend_from_slice(key.as_bytes());
    }
    for extent in contents.extents {
        encode_varint(extent.events, &mut body);
        encode_varint(extent.len, &mut body);
    }

    let mut flags = 0;
    let stored = match compression {
        Compression::Zstd { level } if !contents.data.is_empty() => {
            let compressed = zstd::bulk::compress(contents.data, level)
                .map_err(|e| Error::Encoding(format!("zstd compress: {}", e)))?;
            debug!(
                raw = contents.data.len(),
                compressed = compressed.len(),
                level,
                "Compressed data section"
            );
            if compressed.len() < contents.data.len() {
                flags |= FLAG_ZSTD_DATA;
                Some(compressed)
            } else {
                None
            }
        }
        _ => None,
    };
    let stored_data: &[u8] = stored.as_deref().unwrap_or(contents.data);
    encode_varint(contents.data.len() as u64, &mut body);
    encode_varint(stored_data.len() as u64, &mut body);
    body.extend_from_slice(stored_data);

    debug!(
        dictionary_bytes = dictionary_len,
        body_bytes = body.len(),
        "Encoded store body"
    );

    let header = StoreHeader {
        version: STORE_FORMAT_VERSION,
        flags,
        field_count: dictionary.field_count() as u32,
        trail_count: contents.keys.len() as u64,
        event_count: contents.event_count,
        min_timestamp: contents.min_timestamp,
        max_timestamp: contents.max_timestamp,
        body_len: body.len() as u64,
    };

    let mut file = Vec::with_capacity(STORE_HEADER_SIZE + body.len() + STORE_FOOTER_SIZE);
    file.extend_from_slice(&header.encode());
    file.extend_from_slice(&body);
    let mut footer = [0u8; STORE_FOOTER_SIZE];
    LittleEndian::write_u64(&mut footer, xxh3_64(&body));
    file.extend_from_slice(&footer);
    Ok(file)
}

// ============================================================================
// Decoding
// ============================================================================

/// Bounds-checked cursor over the body
struct SectionReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SectionReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn varint(&mut self) -> Result<u64> {
        decode_varint(self.buf, &mut self.pos)
    }

    /// Read an element count, capped by what the remaining bytes could hold
    fn count(&mut self, what: &str) -> Result<usize> {
        let count = self.varint()?;
        if count > (self.buf.len() - self.pos) as u64 {
            return Err(Error::corrupt(format!(
                "{} count {} exceeds remaining {} bytes",
                what,
                count,
                self.buf.len() - self.pos
            )));
        }
        Ok(count as usize)
    }

    fn take(&mut self, len: u64, what: &str) -> Result<&'a [u8]> {
        let remaining = (self.buf.len() - self.pos) as u64;
        if len > remaining {
            return Err(Error::corrupt(format!(
                "{} of {} bytes truncated at offset {}",
                what, len, self.pos
            )));
        }
        let start = self.pos;
        self.pos += len as usize;
        Ok(&self.buf[start..self.pos])
    }

    fn bytes(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.varint()?;
        self.take(len, what)
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(Error::corrupt(format!(
                "{} unexpected bytes after data section",
                self.buf.len() - self.pos
            )));
        }
        Ok(())
    }
}

/// Parse and validate a complete store file.
pub fn decode_store(bytes: &[u8], verify_checksum: bool) -> Result<StoreImage> {
    let header = StoreHeader::decode(bytes)?;

    let expected_len = (STORE_HEADER_SIZE as u64)
        .checked_add(header.body_len)
        .and_then(|n| n.checked_add(STORE_FOOTER_SIZE as u64))
        .ok_or_else(|| Error::corrupt("body length overflows"))?;
    if bytes.len() as u64 != expected_len {
        return Err(Error::corrupt(format!(
            "file is {} bytes, header describes {}",
            bytes.len(),
            expected_len
        )));
    }

    let body = &bytes[STORE_HEADER_SIZE..STORE_HEADER_SIZE + header.body_len as usize];
    if verify_checksum {
        let stored = LittleEndian::read_u64(&bytes[bytes.len() - STORE_FOOTER_SIZE..]);
        let computed = xxh3_64(body);
        if stored != computed {
            return Err(Error::corrupt(format!(
                "body checksum mismatch: stored {:#018X}, computed {:#018X}",
                stored, computed
            )));
        }
    }

    let mut reader = SectionReader::new(body);

    // Field names
    let field_count = reader.count("field")?;
    if field_count + 1 != header.field_count as usize {
        return Err(Error::corrupt(format!(
            "{} field names, header declares {}",
            field_count, header.field_count
        )));
    }
    let mut field_names = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        let raw = reader.bytes("field name")?;
        let name = std::str::from_utf8(raw)
            .map_err(|e| Error::corrupt(format!("field name is not UTF-8: {}", e)))?;
        field_names.push(name.to_string());
    }

    // Lexicons
    let mut lexicons = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        let count = reader.count("lexicon value")?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(reader.bytes("lexicon value")?.to_vec());
        }
        lexicons.push(values);
    }
    let dictionary = Dictionary::from_lexicons(&field_names, lexicons)?;

    // Keys
    let key_bytes = header
        .trail_count
        .checked_mul(ENTITY_KEY_LEN as u64)
        .ok_or_else(|| Error::corrupt("trail count overflows"))?;
    let raw_keys = reader.take(key_bytes, "key section")?;
    let keys: Vec<EntityKey> = raw_keys
        .chunks_exact(ENTITY_KEY_LEN)
        .map(EntityKey::from_slice)
        .collect::<Result<_>>()?;
    if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(Error::corrupt("entity keys are not strictly ascending"));
    }

    // Table of contents
    let mut extents = Vec::with_capacity(keys.len());
    let mut total_events: u64 = 0;
    let mut total_len: u64 = 0;
    for _ in 0..keys.len() {
        let extent = TrailExtent {
            events: reader.varint()?,
            len: reader.varint()?,
        };
        total_events = total_events
            .checked_add(extent.events)
            .ok_or_else(|| Error::corrupt("event count overflows"))?;
        total_len = total_len
            .checked_add(extent.len)
            .ok_or_else(|| Error::corrupt("data length overflows"))?;
        extents.push(extent);
    }
    if total_events != header.event_count {
        return Err(Error::corrupt(format!(
            "table of contents holds {} events, header declares {}",
            total_events, header.event_count
        )));
    }

    // Data
    let raw_len = reader.varint()?;
    let stored_len = reader.varint()?;
    let stored = reader.take(stored_len, "data section")?;
    reader.finish()?;
    if raw_len != total_len {
        return Err(Error::corrupt(format!(
            "data section is {} bytes, table of contents covers {}",
            raw_len, total_len
        )));
    }

    let data = if header.is_compressed() {
        let data = zstd::bulk::decompress(stored, raw_len as usize)
            .map_err(|e| Error::corrupt(format!("zstd decode: {}", e)))?;
        if data.len() as u64 != raw_len {
            return Err(Error::corrupt(format!(
                "decompressed {} bytes, expected {}",
                data.len(),
                raw_len
            )));
        }
        data
    } else {
        if stored_len != raw_len {
            return Err(Error::corrupt("uncompressed data length mismatch"));
        }
        stored.to_vec()
    };

    Ok(StoreImage {
        header,
        dictionary,
        keys,
        extents,
        data,
    })
}
