//! Field dictionary
//!
//! Maps field names to dense [`FieldId`]s and interns field values into
//! [`ItemId`]s. Every user field owns an independent lexicon, so the same
//! bytes in two fields produce two different items.
//!
//! The dictionary has two capability views over one owned structure:
//!
//! - [`DictionaryBuilder`]: construction-time view, the only one that can
//!   intern new values. Derefs to [`Dictionary`] for lookups.
//! - [`Dictionary`]: query-time view, read-only.
//!
//! [`DictionaryBuilder::finish`] is a one-way conversion; a finished
//! dictionary never grows again.

use crate::error::{Error, Result};
use crate::types::{FieldId, ItemId, TIMESTAMP_FIELD_NAME};
use rustc_hash::FxHashMap;
use std::ops::Deref;

/// Maximum number of user fields in a schema.
pub const MAX_FIELDS: usize = 16_382;

/// Values of one field, index 0 being the empty value
#[derive(Debug, Clone)]
struct Lexicon {
    values: Vec<Box<[u8]>>,
    index: FxHashMap<Box<[u8]>, u32>,
}

impl Lexicon {
    fn new() -> Self {
        let mut index = FxHashMap::default();
        index.insert(Box::<[u8]>::default(), 0);
        Self {
            values: vec![Box::default()],
            index,
        }
    }

    #[inline]
    fn get(&self, raw: &[u8]) -> Option<u32> {
        self.index.get(raw).copied()
    }

    fn intern(&mut self, raw: &[u8]) -> Result<u32> {
        if let Some(id) = self.get(raw) {
            return Ok(id);
        }
        let id = u32::try_from(self.values.len())
            .map_err(|_| Error::Encoding("too many distinct values for one field".into()))?;
        let boxed: Box<[u8]> = raw.into();
        self.values.push(boxed.clone());
        self.index.insert(boxed, id);
        Ok(id)
    }
}

/// Read-only view of field names and value lexicons
#[derive(Debug, Clone)]
pub struct Dictionary {
    /// All field names, `time` first
    field_names: Vec<String>,
    field_index: FxHashMap<String, FieldId>,
    /// One lexicon per user field
    lexicons: Vec<Lexicon>,
}

impl Dictionary {
    /// Create an empty dictionary for the given user fields
    ///
    /// Fails with [`Error::Schema`] on empty, duplicate or reserved names, or
    /// when the schema exceeds [`MAX_FIELDS`].
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Result<Self> {
        if fields.len() > MAX_FIELDS {
            return Err(Error::Schema(format!(
                "{} fields exceeds the maximum of {}",
                fields.len(),
                MAX_FIELDS
            )));
        }

        let mut field_names = Vec::with_capacity(fields.len() + 1);
        let mut field_index = FxHashMap::default();
        field_names.push(TIMESTAMP_FIELD_NAME.to_string());
        field_index.insert(TIMESTAMP_FIELD_NAME.to_string(), FieldId::TIMESTAMP);

        for (i, name) in fields.iter().enumerate() {
            let name = name.as_ref();
            if name.is_empty() {
                return Err(Error::Schema(format!("field {} has an empty name", i)));
            }
            if name == TIMESTAMP_FIELD_NAME {
                return Err(Error::Schema(format!(
                    "field name '{}' is reserved for the timestamp",
                    name
                )));
            }
            if field_index
                .insert(name.to_string(), FieldId::for_user_index(i))
                .is_some()
            {
                return Err(Error::Schema(format!("duplicate field name '{}'", name)));
            }
            field_names.push(name.to_string());
        }

        Ok(Self {
            field_names,
            field_index,
            lexicons: (0..fields.len()).map(|_| Lexicon::new()).collect(),
        })
    }

    /// Rebuild a dictionary from persisted lexicons
    ///
    /// `lexicons[i]` lists the non-empty values of user field `i` in value
    /// index order, starting at index 1. Inconsistent input is reported as
    /// [`Error::CorruptFormat`].
    pub fn from_lexicons<S: AsRef<str>>(fields: &[S], lexicons: Vec<Vec<Vec<u8>>>) -> Result<Self> {
        if lexicons.len() != fields.len() {
            return Err(Error::corrupt(format!(
                "{} lexicons for {} fields",
                lexicons.len(),
                fields.len()
            )));
        }
        let mut dict = Self::new(fields).map_err(|e| Error::corrupt(e.to_string()))?;

        for (lexicon, values) in dict.lexicons.iter_mut().zip(lexicons) {
            lexicon.values.reserve(values.len());
            for value in values {
                let expected = lexicon.values.len() as u32;
                if lexicon.intern(&value)? != expected {
                    return Err(Error::corrupt("duplicate or empty value in lexicon"));
                }
            }
        }
        Ok(dict)
    }

    /// Number of fields, including the timestamp field
    pub fn field_count(&self) -> usize {
        self.field_names.len()
    }

    /// Number of user fields
    pub fn user_field_count(&self) -> usize {
        self.lexicons.len()
    }

    /// User field names in schema order, without the timestamp field
    pub fn field_names(&self) -> &[String] {
        &self.field_names[1..]
    }

    /// Look up a field id by name
    ///
    /// `time` resolves to [`FieldId::TIMESTAMP`].
    pub fn field_id(&self, name: &str) -> Result<FieldId> {
        self.field_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Name of a field, `None` if the id is out of range
    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.field_names
            .get(field.as_u16() as usize)
            .map(String::as_str)
    }

    fn lexicon(&self, field: FieldId) -> Option<&Lexicon> {
        field.user_index().and_then(|i| self.lexicons.get(i))
    }

    /// Look up the item of `raw` in `field` without interning
    ///
    /// Returns `None` for values never seen in this field, and for the
    /// timestamp field which has no items.
    pub fn item(&self, field: FieldId, raw: &[u8]) -> Option<ItemId> {
        let value = self.lexicon(field)?.get(raw)?;
        Some(ItemId::new(field, value))
    }

    /// Like [`Dictionary::item`], resolving the field by name
    pub fn item_by_name(&self, field: &str, raw: &[u8]) -> Option<ItemId> {
        let field = self.field_id(field).ok()?;
        self.item(field, raw)
    }

    /// Resolve an item back to its field and raw value
    pub fn resolve(&self, item: ItemId) -> Option<(FieldId, &[u8])> {
        let field = item.field_of();
        let value = self
            .lexicon(field)?
            .values
            .get(item.value_of() as usize)?;
        Some((field, &value[..]))
    }

    /// Raw value of an item, empty if the item is unknown
    #[inline]
    pub fn value(&self, item: ItemId) -> &[u8] {
        self.resolve(item).map(|(_, v)| v).unwrap_or(&[])
    }

    /// Raw value by user field index and value index, empty if unknown
    #[inline]
    pub fn value_at(&self, user_index: usize, value: u32) -> &[u8] {
        self.lexicons
            .get(user_index)
            .and_then(|l| l.values.get(value as usize))
            .map(|v| &v[..])
            .unwrap_or(&[])
    }

    /// Number of values of a field, including the empty value
    pub fn lexicon_len(&self, field: FieldId) -> usize {
        self.lexicon(field).map_or(0, |l| l.values.len())
    }

    /// Non-empty values of a field, in value index order starting at 1
    pub fn lexicon_values(&self, field: FieldId) -> impl Iterator<Item = &[u8]> + '_ {
        self.lexicon(field)
            .into_iter()
            .flat_map(|l| l.values.iter().skip(1).map(|v| &v[..]))
    }
}

/// Construction-time view of a [`Dictionary`]
///
/// The only way to add values to a dictionary. Lookups go through
/// `Deref<Target = Dictionary>`.
#[derive(Debug, Clone)]
pub struct DictionaryBuilder {
    dict: Dictionary,
}

impl DictionaryBuilder {
    /// Create a builder for the given user fields
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Result<Self> {
        Ok(Self {
            dict: Dictionary::new(fields)?,
        })
    }

    /// Intern `raw` in `field`, returning its item
    ///
    /// Idempotent: the same bytes in the same field always yield the same
    /// item.
    pub fn intern(&mut self, field: FieldId, raw: &[u8]) -> Result<ItemId> {
        let index = field.user_index().ok_or_else(|| {
            Error::Schema("the timestamp field has no values to intern".to_string())
        })?;
        let value = self.intern_at(index, raw)?;
        Ok(ItemId::new(field, value))
    }

    /// Intern by user field index, returning the value index
    #[inline]
    pub fn intern_at(&mut self, user_index: usize, raw: &[u8]) -> Result<u32> {
        let lexicon = self
            .dict
            .lexicons
            .get_mut(user_index)
            .ok_or_else(|| Error::UnknownField(format!("#{}", user_index + 1)))?;
        lexicon.intern(raw)
    }

    /// Freeze into the read-only view
    pub fn finish(self) -> Dictionary {
        self.dict
    }
}

impl Deref for DictionaryBuilder {
    type Target = Dictionary;

    fn deref(&self) -> &Dictionary {
        &self.dict
    }
}
