//! Query layer for trailstore
//!
//! Everything that reads events out of a finalized [`Store`]:
//! - [`Cursor`]: forward iteration over one trail, with an optional filter
//! - [`Event`]: one decoded event and its field values
//! - [`EventFilter`]: compiled OR-of-ANDs predicate over field values
//! - [`MultiCursor`]: time-ordered merge of many cursors
//! - [`RecordDecoder`]: mapping events onto caller-defined record types
//!
//! [`Store`]: trailstore_storage::Store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod decode;
pub mod event;
pub mod filter;
pub mod multi_cursor;

pub use cursor::Cursor;
pub use decode::{RecordDecoder, TrailRecord};
pub use event::Event;
pub use filter::{EventFilter, FilterTerm};
pub use multi_cursor::{MergedEvent, MultiCursor};
