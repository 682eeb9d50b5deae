//! Store construction
//!
//! A [`StoreBuilder`] buffers records in memory, interning field values as
//! they arrive, and writes the immutable store file in one pass at
//! [`StoreBuilder::finalize`].
//!
//! # Lifecycle
//!
//! ```text
//! open ──add/append──▶ open ──finalize──▶ finalized
//!   │                                         │
//!   └────────close / drop──────────▶ closed ◀─┘
//! ```
//!
//! The store is written to a scratch file `<path>.tmp` that is renamed onto
//! `path` only once fully written, so an abandoned builder never leaves a
//! readable store behind.
//!
//! # Example
//!
//! ```no_run
//! use trailstore_storage::StoreBuilder;
//!
//! let mut builder = StoreBuilder::open("events.trl", &["action", "page"])?;
//! builder.add(&[0x12; 16], 1_700_000_000, &["view", "/home"])?;
//! builder.add(&[0x12; 16], 1_700_000_060, &["click"])?;
//! let summary = builder.finalize()?;
//! assert_eq!(summary.event_count, 2);
//! # Ok::<(), trailstore_core::Error>(())
//! ```

use crate::config::BuilderOptions;
use crate::format::{encode_store, StoreContents, TrailEncoder, TrailExtent};
use crate::store::Store;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trailstore_core::{DictionaryBuilder, EntityKey, Error, Result, Timestamp};

/// One buffered event: timestamp plus one value index per user field
#[derive(Debug, Clone)]
struct PendingEvent {
    timestamp: Timestamp,
    values: SmallVec<[u32; 8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Open,
    Finalized,
    Closed,
}

/// What [`StoreBuilder::finalize`] wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    /// Final store path
    pub path: PathBuf,
    /// Number of trails (distinct entity keys)
    pub trail_count: u64,
    /// Number of events
    pub event_count: u64,
    /// Number of fields, including the timestamp field
    pub field_count: usize,
    /// Smallest timestamp, 0 when empty
    pub min_timestamp: Timestamp,
    /// Largest timestamp, 0 when empty
    pub max_timestamp: Timestamp,
    /// Size of the store file
    pub bytes_written: u64,
}

/// Single-writer builder of an immutable store file
pub struct StoreBuilder {
    path: PathBuf,
    scratch_path: PathBuf,
    scratch: Option<File>,
    options: BuilderOptions,
    dictionary: DictionaryBuilder,
    trails: FxHashMap<EntityKey, Vec<PendingEvent>>,
    event_count: u64,
    state: BuilderState,
}

impl std::fmt::Debug for StoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("path", &self.path)
            .field("fields", &self.dictionary.field_names())
            .field("trails", &self.trails.len())
            .field("events", &self.event_count)
            .field("state", &self.state)
            .finish()
    }
}

fn scratch_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

impl StoreBuilder {
    /// Open a builder writing to `path` with default options
    ///
    /// # Errors
    ///
    /// - [`Error::Schema`] if the field names are empty, duplicated or reserved
    /// - [`Error::Io`] if the scratch file next to `path` cannot be created
    pub fn open<P, S>(path: P, fields: &[S]) -> Result<Self>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        Self::open_with(path, fields, BuilderOptions::default())
    }

    /// Open a builder with explicit options
    pub fn open_with<P, S>(path: P, fields: &[S], options: BuilderOptions) -> Result<Self>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let path = path.as_ref().to_path_buf();
        let dictionary = DictionaryBuilder::new(fields)?;
        let scratch_path = scratch_path_for(&path);
        let scratch = File::create(&scratch_path)?;

        info!(
            path = %path.display(),
            fields = fields.len(),
            "Store builder opened"
        );

        Ok(Self {
            path,
            scratch_path,
            scratch: Some(scratch),
            options,
            dictionary,
            trails: FxHashMap::default(),
            event_count: 0,
            state: BuilderState::Open,
        })
    }

    /// Target path of the store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// User field names in schema order
    pub fn field_names(&self) -> &[String] {
        self.dictionary.field_names()
    }

    /// Number of events added so far
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Number of distinct entity keys added so far
    pub fn trail_count(&self) -> u64 {
        self.trails.len() as u64
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            BuilderState::Open => Ok(()),
            BuilderState::Finalized | BuilderState::Closed => Err(Error::Finalized),
        }
    }

    /// Add one record
    ///
    /// `values` align with the schema; missing trailing values are empty.
    ///
    /// # Errors
    ///
    /// - [`Error::Finalized`] after `finalize` or `close`
    /// - [`Error::BadKeyLength`] if `key` is not 16 bytes
    /// - [`Error::Schema`] if there are more values than fields
    pub fn add<V: AsRef<[u8]>>(
        &mut self,
        key: &[u8],
        timestamp: Timestamp,
        values: &[V],
    ) -> Result<()> {
        self.ensure_open()?;
        let key = EntityKey::from_slice(key)?;
        self.add_event(key, timestamp, values)
    }

    /// Add one record under an already-parsed key
    pub fn add_event<V: AsRef<[u8]>>(
        &mut self,
        key: EntityKey,
        timestamp: Timestamp,
        values: &[V],
    ) -> Result<()> {
        self.ensure_open()?;
        let field_count = self.dictionary.user_field_count();
        if values.len() > field_count {
            return Err(Error::Schema(format!(
                "record has {} values for {} fields",
                values.len(),
                field_count
            )));
        }

        let mut encoded: SmallVec<[u32; 8]> = SmallVec::with_capacity(field_count);
        for (index, value) in values.iter().enumerate() {
            encoded.push(self.dictionary.intern_at(index, value.as_ref())?);
        }
        encoded.resize(field_count, 0);

        self.push(key, timestamp, encoded);
        Ok(())
    }

    fn push(&mut self, key: EntityKey, timestamp: Timestamp, values: SmallVec<[u32; 8]>) {
        self.trails
            .entry(key)
            .or_default()
            .push(PendingEvent { timestamp, values });
        self.event_count += 1;
    }

    /// Copy every event of `store` into this builder
    ///
    /// Fields are matched by name. Builder fields the store lacks are left
    /// empty; store fields the builder lacks are a [`Error::Schema`] error,
    /// reported before anything is copied.
    pub fn append(&mut self, store: &Store) -> Result<()> {
        self.ensure_open()?;

        let mapping: Vec<usize> = store
            .field_names()
            .iter()
            .map(|name| {
                self.dictionary
                    .field_id(name)
                    .ok()
                    .and_then(|id| id.user_index())
                    .ok_or_else(|| {
                        Error::Schema(format!("store field '{}' is not in the builder schema", name))
                    })
            })
            .collect::<Result<_>>()?;

        let field_count = self.dictionary.user_field_count();
        let source = store.dictionary();
        let before = self.event_count;

        for trail in 0..store.trail_count() {
            let key = store.entity_key(trail)?;
            let mut events = store.events(trail)?;
            while events.advance()? {
                let mut encoded: SmallVec<[u32; 8]> = SmallVec::from_elem(0, field_count);
                for (from, &value) in events.values().iter().enumerate() {
                    if value == 0 {
                        continue;
                    }
                    let to = mapping[from];
                    encoded[to] = self
                        .dictionary
                        .intern_at(to, source.value_at(from, value))?;
                }
                self.push(key, events.timestamp(), encoded);
            }
        }

        debug!(
            source = %store.path().display(),
            events = self.event_count - before,
            "Appended store"
        );
        Ok(())
    }

    /// Write the store and make it visible at the target path
    ///
    /// Trails are ordered by entity key and events within a trail by
    /// timestamp, ties keeping insertion order.
    ///
    /// # Errors
    ///
    /// - [`Error::Finalized`] if called twice or after `close`
    /// - [`Error::Encoding`] if the trails cannot be encoded
    /// - [`Error::Io`] if writing, syncing or renaming fails
    pub fn finalize(&mut self) -> Result<StoreSummary> {
        self.ensure_open()?;

        let mut keys: Vec<EntityKey> = self.trails.keys().copied().collect();
        keys.sort_unstable();
        for events in self.trails.values_mut() {
            events.sort_by_key(|e| e.timestamp);
        }

        let (min_timestamp, max_timestamp) = self
            .trails
            .values()
            .flat_map(|events| events.iter().map(|e| e.timestamp))
            .fold(None, |range: Option<(u64, u64)>, ts| match range {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
            })
            .unwrap_or((0, 0));

        debug!(trails = keys.len(), events = self.event_count, "Sorted trails");

        let mut data = Vec::new();
        let mut extents = Vec::with_capacity(keys.len());
        let mut encoder = TrailEncoder::new(min_timestamp, self.dictionary.user_field_count());
        for key in &keys {
            let events = self
                .trails
                .get(key)
                .ok_or_else(|| Error::Encoding(format!("trail {} vanished", key)))?;
            encoder.begin_trail();
            let start = data.len();
            for event in events {
                encoder.encode_event(event.timestamp, &event.values, &mut data)?;
            }
            extents.push(TrailExtent {
                events: events.len() as u64,
                len: (data.len() - start) as u64,
            });
        }

        let contents = StoreContents {
            dictionary: &*self.dictionary,
            keys: &keys,
            extents: &extents,
            data: &data,
            event_count: self.event_count,
            min_timestamp,
            max_timestamp,
        };
        let file_bytes = encode_store(&contents, self.options.compression)?;

        let mut scratch = match self.scratch.take() {
            Some(file) => file,
            None => File::create(&self.scratch_path)?,
        };
        scratch.write_all(&file_bytes)?;
        scratch.flush()?;
        if self.options.sync_on_finalize {
            scratch.sync_all()?;
        }
        drop(scratch);
        std::fs::rename(&self.scratch_path, &self.path)?;

        let summary = StoreSummary {
            path: self.path.clone(),
            trail_count: keys.len() as u64,
            event_count: self.event_count,
            field_count: self.dictionary.field_count(),
            min_timestamp,
            max_timestamp,
            bytes_written: file_bytes.len() as u64,
        };

        self.state = BuilderState::Finalized;
        self.trails = FxHashMap::default();

        info!(
            path = %summary.path.display(),
            trails = summary.trail_count,
            events = summary.event_count,
            bytes = summary.bytes_written,
            "Store finalized"
        );
        Ok(summary)
    }

    /// Release builder resources
    ///
    /// Removes the scratch file of an unfinalized builder. Idempotent; also
    /// run on drop.
    pub fn close(&mut self) -> Result<()> {
        if self.state == BuilderState::Closed {
            return Ok(());
        }
        let was_open = self.state == BuilderState::Open;
        self.state = BuilderState::Closed;
        self.scratch = None;
        self.trails = FxHashMap::default();

        if was_open {
            match std::fs::remove_file(&self.scratch_path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            debug!(path = %self.path.display(), "Discarded unfinalized store");
        }
        Ok(())
    }
}

impl Drop for StoreBuilder {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(
                path = %self.scratch_path.display(),
                error = %e,
                "Failed to remove scratch file"
            );
        }
    }
}
