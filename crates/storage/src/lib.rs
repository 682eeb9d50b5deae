//! Storage layer for trailstore
//!
//! This crate owns everything that touches the store file:
//! - [`StoreBuilder`]: buffers records and writes an immutable store once
//! - [`Store`]: opens a finalized store for concurrent reads
//! - [`format`]: the on-disk byte format (header, sections, trail encoding)
//! - [`BuilderOptions`] / [`OpenOptions`]: write and read configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod format;
pub mod store;

pub use builder::{StoreBuilder, StoreSummary};
pub use config::{BuilderOptions, Compression, OpenOptions};
pub use format::{EventReader, EventState};
pub use store::{Store, TrailData};
