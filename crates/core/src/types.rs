//! Core types for the trail store
//!
//! This module defines the fundamental identifiers used throughout the system:
//! - [`EntityKey`]: 128-bit key of the entity a trail belongs to
//! - [`FieldId`]: dense id of a schema field, `0` being the timestamp
//! - [`ItemId`]: interned `(field, value)` pair

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event timestamp, in seconds. Stored as provided, no timezone handling.
pub type Timestamp = u64;

/// Length of a raw entity key in bytes.
pub const ENTITY_KEY_LEN: usize = 16;

/// Name of the implicit timestamp field (field id 0).
pub const TIMESTAMP_FIELD_NAME: &str = "time";

/// Key of the entity owning a trail
///
/// Keys are opaque 16-byte values, commonly UUIDs. At text boundaries they
/// are written as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(Uuid);

impl EntityKey {
    /// Create a key from raw bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use trailstore_core::EntityKey;
    ///
    /// let key = EntityKey::from_bytes([0x12; 16]);
    /// assert_eq!(key.as_bytes(), &[0x12; 16]);
    /// ```
    pub fn from_bytes(bytes: [u8; ENTITY_KEY_LEN]) -> Self {
        EntityKey(Uuid::from_bytes(bytes))
    }

    /// Create a key from a byte slice, rejecting anything but 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; ENTITY_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| Error::BadKeyLength { len: bytes.len() })?;
        Ok(Self::from_bytes(raw))
    }

    /// Parse a key from hex text
    ///
    /// Accepts the 32-character simple form as well as hyphenated UUIDs.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailstore_core::EntityKey;
    ///
    /// let key = EntityKey::from_hex("12345678123456781234567812345678").unwrap();
    /// assert_eq!(key.to_string(), "12345678123456781234567812345678");
    /// ```
    pub fn from_hex(text: &str) -> Result<Self> {
        Uuid::parse_str(text)
            .map(EntityKey)
            .map_err(|e| Error::InvalidKey(format!("{text}: {e}")))
    }

    /// Get raw bytes representation
    pub fn as_bytes(&self) -> &[u8; ENTITY_KEY_LEN] {
        self.0.as_bytes()
    }
}

impl From<Uuid> for EntityKey {
    fn from(uuid: Uuid) -> Self {
        EntityKey(uuid)
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl std::str::FromStr for EntityKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Dense id of a schema field
///
/// Id 0 is the timestamp; user fields are numbered from 1 in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(u16);

impl FieldId {
    /// The reserved timestamp field.
    pub const TIMESTAMP: FieldId = FieldId(0);

    /// Create a field id from its raw value.
    pub const fn new(raw: u16) -> Self {
        FieldId(raw)
    }

    /// Field id of the user field at `index` in schema order (0-based).
    pub fn for_user_index(index: usize) -> Self {
        FieldId((index + 1) as u16)
    }

    /// Raw id value
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Position among user fields, `None` for the timestamp field.
    pub fn user_index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    /// Check if this is the timestamp field
    pub fn is_timestamp(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

const ITEM_FIELD_BITS: u32 = 16;
const ITEM_FIELD_MASK: u64 = (1 << ITEM_FIELD_BITS) - 1;

/// Interned `(field, value)` pair
///
/// Item ids are unique within one store. Value index 0 is the empty value of
/// its field, so `ItemId::new(field, 0)` is the item of an unset field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    /// Pack a field id and a value index.
    pub fn new(field: FieldId, value: u32) -> Self {
        ItemId(((value as u64) << ITEM_FIELD_BITS) | field.0 as u64)
    }

    /// Field this item belongs to
    pub fn field_of(self) -> FieldId {
        FieldId((self.0 & ITEM_FIELD_MASK) as u16)
    }

    /// Index of the value within its field's lexicon
    pub fn value_of(self) -> u32 {
        (self.0 >> ITEM_FIELD_BITS) as u32
    }

    /// Check if this is the empty value of its field
    pub fn is_empty_value(self) -> bool {
        self.value_of() == 0
    }

    /// Raw packed representation
    pub fn as_u64(self) -> u64 {
        self.0
    }
}
