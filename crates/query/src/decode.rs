//! Decoding events into caller-defined records
//!
//! A record type lists the fields it wants through [`TrailRecord::field_tags`].
//! [`RecordDecoder`] resolves those tags against the store once per record
//! type and interns value strings, so decoding a long trail allocates one
//! string per distinct value rather than one per event.
//!
//! ```no_run
//! use std::sync::Arc;
//! use trailstore_query::{RecordDecoder, TrailRecord};
//! use trailstore_storage::Store;
//!
//! struct PageView {
//!     timestamp: u64,
//!     title: Arc<str>,
//!     user: Arc<str>,
//! }
//!
//! impl TrailRecord for PageView {
//!     fn field_tags() -> &'static [&'static str] {
//!         &["title", "user"]
//!     }
//!
//!     fn from_event(timestamp: u64, values: &[Arc<str>]) -> Self {
//!         PageView {
//!             timestamp,
//!             title: values[0].clone(),
//!             user: values[1].clone(),
//!         }
//!     }
//! }
//!
//! let store = Store::open("wikipedia.trl")?;
//! let mut decoder = RecordDecoder::new(&store);
//! let views: Vec<PageView> = decoder.decode_trail(0)?;
//! # Ok::<(), trailstore_core::Error>(())
//! ```

use crate::cursor::Cursor;
use crate::event::Event;
use rustc_hash::FxHashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::debug;
use trailstore_core::{FieldId, ItemId, Result, Timestamp};
use trailstore_storage::Store;

/// A record type that events can be decoded into
pub trait TrailRecord: Sized + 'static {
    /// Field names to extract, in the order `from_event` receives them
    ///
    /// `time` yields the event timestamp in decimal. Names the store does
    /// not know yield empty strings.
    fn field_tags() -> &'static [&'static str];

    /// Build a record from an event's timestamp and tagged values
    fn from_event(timestamp: Timestamp, values: &[Arc<str>]) -> Self;
}

/// Decodes events of one store into [`TrailRecord`] types
pub struct RecordDecoder<'s> {
    store: &'s Store,
    mappings: FxHashMap<TypeId, Arc<[Option<FieldId>]>>,
    interned: FxHashMap<ItemId, Arc<str>>,
    empty: Arc<str>,
    values: Vec<Arc<str>>,
}

impl<'s> RecordDecoder<'s> {
    /// Create a decoder for `store`
    pub fn new(store: &'s Store) -> Self {
        Self {
            store,
            mappings: FxHashMap::default(),
            interned: FxHashMap::default(),
            empty: Arc::from(""),
            values: Vec::new(),
        }
    }

    /// Number of distinct values interned so far
    pub fn interned_len(&self) -> usize {
        self.interned.len()
    }

    fn mapping<R: TrailRecord>(&mut self) -> Arc<[Option<FieldId>]> {
        let store = self.store;
        self.mappings
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                let mapping: Arc<[Option<FieldId>]> = R::field_tags()
                    .iter()
                    .map(|tag| store.field_id(tag).ok())
                    .collect();
                debug!(
                    record = std::any::type_name::<R>(),
                    tags = mapping.len(),
                    resolved = mapping.iter().filter(|f| f.is_some()).count(),
                    "Prepared record mapping"
                );
                mapping
            })
            .clone()
    }

    /// Decode one event into `R`
    pub fn decode<R: TrailRecord>(&mut self, event: &Event<'_>) -> R {
        let mapping = self.mapping::<R>();
        self.values.clear();
        for field in mapping.iter() {
            let value = match field {
                None => self.empty.clone(),
                Some(field) if field.is_timestamp() => Arc::from(event.timestamp().to_string()),
                Some(field) => match event.item(*field) {
                    None => self.empty.clone(),
                    Some(item) => {
                        let raw = self.store.dictionary().value(item);
                        self.interned
                            .entry(item)
                            .or_insert_with(|| Arc::from(String::from_utf8_lossy(raw)))
                            .clone()
                    }
                },
            };
            self.values.push(value);
        }
        R::from_event(event.timestamp(), &self.values)
    }

    /// Decode every event of `trail`, oldest first
    pub fn decode_trail<R: TrailRecord>(&mut self, trail: u64) -> Result<Vec<R>> {
        let mut cursor = Cursor::new(self.store);
        cursor.bind(trail)?;
        let mut records = Vec::with_capacity(cursor.len() as usize);
        while let Some(event) = cursor.next_event()? {
            records.push(self.decode::<R>(&event));
        }
        Ok(records)
    }
}
