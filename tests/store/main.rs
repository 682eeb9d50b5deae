//! Store Integration Tests
//!
//! Tests for building, opening and scanning stores through the public
//! facade: builder lifecycle, metadata, `find_trails`, file corruption and
//! randomized round-trips.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test store
//! cargo test --test store properties::
//! ```

#[path = "../common/mod.rs"]
mod common;

mod builder_lifecycle;
mod corruption;
mod metadata;
