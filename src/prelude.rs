//! Convenient imports for trailstore.
//!
//! ```no_run
//! use trailstore::prelude::*;
//!
//! let store = Store::open("visits.trl")?;
//! let trails = store.find_trails(&[("page", "/home")])?;
//! # Ok::<(), trailstore::Error>(())
//! ```

// Building and opening stores
pub use trailstore_storage::{BuilderOptions, OpenOptions, Store, StoreBuilder};

// Error handling
pub use trailstore_core::{Error, Result};

// Core types
pub use trailstore_core::{EntityKey, FieldId, ItemId, Timestamp};

// Reading
pub use trailstore_query::{
    Cursor, Event, EventFilter, FilterTerm, MergedEvent, MultiCursor, RecordDecoder, TrailRecord,
};

// Filters are shared between cursors
pub use std::sync::Arc;
