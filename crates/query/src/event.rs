//! Decoded events

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use trailstore_core::{Dictionary, FieldId, ItemId, Timestamp};

/// One event of a trail
///
/// Carries exactly one item per user field; unset fields hold the empty
/// value. Values resolve through the store's dictionary on every access.
#[derive(Clone)]
pub struct Event<'s> {
    dictionary: &'s Dictionary,
    timestamp: Timestamp,
    items: SmallVec<[ItemId; 8]>,
}

impl<'s> Event<'s> {
    pub(crate) fn from_values(
        dictionary: &'s Dictionary,
        timestamp: Timestamp,
        values: &[u32],
    ) -> Self {
        let items = values
            .iter()
            .enumerate()
            .map(|(i, &value)| ItemId::new(FieldId::for_user_index(i), value))
            .collect();
        Self {
            dictionary,
            timestamp,
            items,
        }
    }

    /// Event timestamp
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Items in schema order, one per user field
    #[inline]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Item of a field, `None` for the timestamp field or an unknown id
    pub fn item(&self, field: FieldId) -> Option<ItemId> {
        field.user_index().and_then(|i| self.items.get(i)).copied()
    }

    /// Raw value of a field, empty for the timestamp or an unknown id
    pub fn value(&self, field: FieldId) -> &'s [u8] {
        self.item(field)
            .map(|item| self.dictionary.value(item))
            .unwrap_or(&[])
    }

    /// Raw value of a field by name, empty if the field is unknown
    pub fn get(&self, field: &str) -> &'s [u8] {
        self.dictionary
            .field_id(field)
            .map(|id| self.value(id))
            .unwrap_or(&[])
    }

    /// Value of a field by name as UTF-8, lossily converted
    pub fn get_str(&self, field: &str) -> String {
        String::from_utf8_lossy(self.get(field)).into_owned()
    }

    /// Every user field mapped to its value, empty values included
    pub fn as_map(&self) -> BTreeMap<String, String> {
        self.dictionary
            .field_names()
            .iter()
            .zip(self.items.iter())
            .map(|(name, &item)| {
                let value = String::from_utf8_lossy(self.dictionary.value(item)).into_owned();
                (name.clone(), value)
            })
            .collect()
    }

    /// Dictionary the event resolves its values through
    pub fn dictionary(&self) -> &'s Dictionary {
        self.dictionary
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("timestamp", &self.timestamp)
            .field("items", &self.items)
            .finish()
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.timestamp)?;
        for (name, &item) in self.dictionary.field_names().iter().zip(self.items.iter()) {
            write!(
                f,
                " {}={}",
                name,
                String::from_utf8_lossy(self.dictionary.value(item))
            )?;
        }
        Ok(())
    }
}
