//! # Trailstore
//!
//! Read-optimized, append-then-freeze store for per-entity event trails.
//!
//! A store is built once from `(entity, timestamp, field values)` records and
//! then opened read-only. Every entity owns a trail: its events in timestamp
//! order, each carrying one value per schema field.
//!
//! ## Quick Start
//!
//! ```no_run
//! use trailstore::prelude::*;
//!
//! // Build
//! let mut builder = StoreBuilder::open("visits.trl", &["page", "referrer"])?;
//! builder.add(&[0x12; 16], 1_700_000_000, &["/home", "search"])?;
//! builder.add(&[0x12; 16], 1_700_000_030, &["/docs"])?;
//! builder.finalize()?;
//!
//! // Read
//! let store = Store::open("visits.trl")?;
//! let mut cursor = Cursor::new(&store);
//! cursor.bind(0)?;
//! while let Some(event) = cursor.next_event()? {
//!     println!("{}", event);
//! }
//! # Ok::<(), trailstore::Error>(())
//! ```
//!
//! ## Layers
//!
//! - [`trailstore_core`]: keys, ids, errors and the field [`Dictionary`]
//! - [`trailstore_storage`]: [`StoreBuilder`], [`Store`] and the file format
//! - [`trailstore_query`]: [`Cursor`], [`EventFilter`], [`MultiCursor`] and
//!   [`RecordDecoder`]

#![warn(missing_docs)]

pub mod prelude;

// Re-export main entry points
pub use trailstore_core::{
    Dictionary, EntityKey, Error, FieldId, ItemId, Result, Timestamp, TIMESTAMP_FIELD_NAME,
};
pub use trailstore_query::{
    Cursor, Event, EventFilter, FilterTerm, MergedEvent, MultiCursor, RecordDecoder, TrailRecord,
};
pub use trailstore_storage::{
    BuilderOptions, Compression, OpenOptions, Store, StoreBuilder, StoreSummary,
};
