//! Core types for trailstore
//!
//! This crate defines the vocabulary shared by every other layer:
//! - [`EntityKey`]: 16-byte identifier of the entity owning a trail
//! - [`FieldId`] / [`ItemId`]: dense field ids and interned `(field, value)` pairs
//! - [`Dictionary`] / [`DictionaryBuilder`]: read and write views of the field lexicons
//! - [`Error`]: the canonical error type for all trailstore operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dictionary;
pub mod error;
pub mod types;

pub use dictionary::{Dictionary, DictionaryBuilder, MAX_FIELDS};
pub use error::{Error, Result};
pub use types::{EntityKey, FieldId, ItemId, Timestamp, ENTITY_KEY_LEN, TIMESTAMP_FIELD_NAME};
