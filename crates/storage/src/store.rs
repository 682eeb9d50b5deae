//! Immutable store reader
//!
//! [`Store::open`] reads and validates a store file once, keeping the
//! dictionary, the key table and the (decompressed) encoded trails in
//! memory. A `Store` is never modified afterwards and is `Send + Sync`, so
//! any number of cursors, in any number of threads, can read it at once.

use crate::config::OpenOptions;
use crate::format::{decode_store, EventReader, StoreHeader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trailstore_core::{Dictionary, EntityKey, Error, FieldId, Result, Timestamp};

/// Location of one trail in the data section
#[derive(Debug, Clone, Copy)]
struct TrailSlot {
    offset: usize,
    len: usize,
    events: u64,
}

/// Encoded events of one trail, as handed to cursors
#[derive(Debug, Clone, Copy)]
pub struct TrailData<'a> {
    /// Encoded event bytes
    pub bytes: &'a [u8],
    /// Number of events encoded in `bytes`
    pub events: u64,
}

/// A finalized, read-only store
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    header: StoreHeader,
    dictionary: Dictionary,
    keys: Vec<EntityKey>,
    trails: Vec<TrailSlot>,
    data: Vec<u8>,
}

impl Store {
    /// Open the store at `path` with default options
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if nothing exists at `path`
    /// - [`Error::CorruptFormat`] if the file is truncated or invalid
    /// - [`Error::Io`] for any other read failure
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &OpenOptions::default())
    }

    /// Open the store at `path` with explicit options
    pub fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;

        if !options.verify_checksum {
            warn!(path = %path.display(), "Opening store without body checksum verification");
        }
        let image = decode_store(&bytes, options.verify_checksum)?;
        drop(bytes);

        let mut trails = Vec::with_capacity(image.extents.len());
        let mut offset = 0usize;
        for extent in &image.extents {
            let len = extent.len as usize;
            trails.push(TrailSlot {
                offset,
                len,
                events: extent.events,
            });
            offset += len;
        }

        let store = Self {
            path: path.to_path_buf(),
            header: image.header,
            dictionary: image.dictionary,
            keys: image.keys,
            trails,
            data: image.data,
        };

        if options.validate_trails {
            store.validate_trails()?;
        }

        info!(
            path = %store.path.display(),
            trails = store.trail_count(),
            events = store.event_count(),
            fields = store.field_count(),
            compressed = store.header.is_compressed(),
            "Store opened"
        );
        Ok(store)
    }

    /// Decode every trail, checking value indexes and timestamp bounds.
    fn validate_trails(&self) -> Result<()> {
        let limits: Vec<u32> = (0..self.dictionary.user_field_count())
            .map(|i| self.dictionary.lexicon_len(FieldId::for_user_index(i)) as u32)
            .collect();

        for trail in 0..self.trail_count() {
            let mut events = self.events(trail)?;
            while events.advance()? {
                if events.timestamp() > self.max_timestamp() {
                    return Err(Error::corrupt(format!(
                        "trail {} has timestamp {} past the store maximum {}",
                        trail,
                        events.timestamp(),
                        self.max_timestamp()
                    )));
                }
                for (field, (&value, &limit)) in events.values().iter().zip(&limits).enumerate() {
                    if value >= limit {
                        return Err(Error::corrupt(format!(
                            "trail {} references value {} of field {} which has {}",
                            trail,
                            value,
                            field + 1,
                            limit
                        )));
                    }
                }
            }
        }
        debug!(trails = self.trail_count(), "Validated all trails");
        Ok(())
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Path the store was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// On-disk format version
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Check whether the data section was stored zstd-compressed
    pub fn is_compressed(&self) -> bool {
        self.header.is_compressed()
    }

    /// Number of trails
    pub fn trail_count(&self) -> u64 {
        self.keys.len() as u64
    }

    /// Number of fields, including the timestamp field
    pub fn field_count(&self) -> usize {
        self.dictionary.field_count()
    }

    /// Number of events over all trails
    pub fn event_count(&self) -> u64 {
        self.header.event_count
    }

    /// Smallest timestamp in the store, 0 when empty
    pub fn min_timestamp(&self) -> Timestamp {
        self.header.min_timestamp
    }

    /// Largest timestamp in the store, 0 when empty
    pub fn max_timestamp(&self) -> Timestamp {
        self.header.max_timestamp
    }

    /// Size of the decoded trail data in bytes
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Field names and value lexicons
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// User field names in schema order, without `time`
    pub fn field_names(&self) -> &[String] {
        self.dictionary.field_names()
    }

    /// Look up a field id by name
    pub fn field_id(&self, name: &str) -> Result<FieldId> {
        self.dictionary.field_id(name)
    }

    // ========================================================================
    // Trails
    // ========================================================================

    /// Trail index of an entity key
    pub fn entity_index(&self, key: &EntityKey) -> Result<u64> {
        self.keys
            .binary_search(key)
            .map(|i| i as u64)
            .map_err(|_| Error::NotFound(format!("entity {}", key)))
    }

    /// Entity key of a trail
    ///
    /// Any index outside `[0, trail_count)` is [`Error::NotFound`].
    pub fn entity_key(&self, trail: u64) -> Result<EntityKey> {
        usize::try_from(trail)
            .ok()
            .and_then(|i| self.keys.get(i))
            .copied()
            .ok_or_else(|| Error::NotFound(format!("trail {}", trail)))
    }

    /// Entity keys of all trails, in trail order
    pub fn entity_keys(&self) -> &[EntityKey] {
        &self.keys
    }

    fn slot(&self, trail: u64) -> Result<&TrailSlot> {
        usize::try_from(trail)
            .ok()
            .and_then(|i| self.trails.get(i))
            .ok_or(Error::BadIndex {
                index: trail,
                count: self.trail_count(),
            })
    }

    /// Number of events in a trail
    pub fn trail_length(&self, trail: u64) -> Result<u64> {
        Ok(self.slot(trail)?.events)
    }

    /// Encoded bytes of a trail
    pub fn trail(&self, trail: u64) -> Result<TrailData<'_>> {
        let slot = self.slot(trail)?;
        Ok(TrailData {
            bytes: &self.data[slot.offset..slot.offset + slot.len],
            events: slot.events,
        })
    }

    /// Raw event reader over a trail
    ///
    /// Yields timestamps and value indexes; cursors build on the same
    /// decoding with item materialization and filtering on top.
    pub fn events(&self, trail: u64) -> Result<EventReader<'_>> {
        let data = self.trail(trail)?;
        Ok(EventReader::new(
            data.bytes,
            data.events,
            self.min_timestamp(),
            self.dictionary.user_field_count(),
        ))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Trails with at least one event carrying every `(field, value)` pair
    ///
    /// A full scan in trail order. Any unknown field or value means no trail
    /// can match, and the result is empty. An empty query matches every
    /// trail that has at least one event.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use trailstore_storage::Store;
    /// let store = Store::open("events.trl")?;
    /// let trails = store.find_trails(&[("action", "click"), ("page", "/home")])?;
    /// # Ok::<(), trailstore_core::Error>(())
    /// ```
    pub fn find_trails<F, V>(&self, pairs: &[(F, V)]) -> Result<Vec<u64>>
    where
        F: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let mut wanted = Vec::with_capacity(pairs.len());
        for (field, value) in pairs {
            let item = self
                .dictionary
                .item_by_name(field.as_ref(), value.as_ref());
            match item.and_then(|item| item.field_of().user_index().map(|i| (i, item))) {
                Some((index, item)) => wanted.push((index, item.value_of())),
                None => {
                    debug!(field = field.as_ref(), "Unresolvable find query term");
                    return Ok(Vec::new());
                }
            }
        }

        let mut found = Vec::new();
        for trail in 0..self.trail_count() {
            let mut events = self.events(trail)?;
            while events.advance()? {
                let values = events.values();
                if wanted.iter().all(|&(index, value)| values[index] == value) {
                    found.push(trail);
                    break;
                }
            }
        }
        debug!(terms = pairs.len(), matches = found.len(), "Scanned trails");
        Ok(found)
    }
}
