//! Per-trail cursor
//!
//! A [`Cursor`] walks the events of one trail at a time, oldest first:
//!
//! ```text
//! Unbound ──bind(t)──▶ Bound(t, pos) ──next_event…──▶ Exhausted(t)
//!                          ▲                               │
//!                          └───────────bind(t')────────────┘
//! ```
//!
//! Rebinding reuses the cursor's decode buffers. A cursor borrows its store
//! and can never outlive it; any number of cursors may read one store
//! concurrently.

use crate::event::Event;
use crate::filter::EventFilter;
use std::sync::Arc;
use trailstore_core::{Error, Result, Timestamp};
use trailstore_storage::{EventState, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Unbound,
    Bound { trail: u64 },
    Exhausted { trail: u64 },
}

/// Forward iterator over the events of one trail
#[derive(Debug)]
pub struct Cursor<'s> {
    store: &'s Store,
    state: CursorState,
    data: &'s [u8],
    pos: usize,
    length: u64,
    remaining: u64,
    decoder: EventState,
    filter: Option<Arc<EventFilter>>,
}

impl<'s> Cursor<'s> {
    /// Create an unbound cursor over `store`
    pub fn new(store: &'s Store) -> Self {
        Self {
            store,
            state: CursorState::Unbound,
            data: &[],
            pos: 0,
            length: 0,
            remaining: 0,
            decoder: EventState::new(store.dictionary().user_field_count()),
            filter: None,
        }
    }

    /// Store this cursor reads
    pub fn store(&self) -> &'s Store {
        self.store
    }

    /// Position the cursor at the first event of `trail`
    ///
    /// # Errors
    ///
    /// [`Error::BadIndex`] if `trail` is out of range; the cursor keeps its
    /// previous state.
    pub fn bind(&mut self, trail: u64) -> Result<()> {
        let data = self.store.trail(trail)?;
        self.data = data.bytes;
        self.pos = 0;
        self.length = data.events;
        self.remaining = data.events;
        self.decoder.reset(self.store.min_timestamp());
        self.state = if data.events == 0 {
            CursorState::Exhausted { trail }
        } else {
            CursorState::Bound { trail }
        };
        Ok(())
    }

    /// Trail the cursor is bound to, `None` if unbound
    pub fn trail(&self) -> Option<u64> {
        match self.state {
            CursorState::Unbound => None,
            CursorState::Bound { trail } | CursorState::Exhausted { trail } => Some(trail),
        }
    }

    /// Check whether every event of the bound trail has been consumed
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, CursorState::Exhausted { .. })
    }

    /// Total events of the bound trail, 0 when unbound
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Check whether the bound trail has no events
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Events not yet consumed, 0 when unbound
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Only yield events matching `filter` from now on
    pub fn set_filter(&mut self, filter: Arc<EventFilter>) {
        self.filter = Some(filter);
    }

    /// Yield every event from now on
    pub fn unset_filter(&mut self) {
        self.filter = None;
    }

    /// Filter currently attached
    pub fn filter(&self) -> Option<&Arc<EventFilter>> {
        self.filter.as_ref()
    }

    /// Decode up to the next event passing the filter.
    fn advance(&mut self) -> Result<bool> {
        let trail = match self.state {
            CursorState::Unbound => return Err(Error::Unbound),
            CursorState::Exhausted { .. } => return Ok(false),
            CursorState::Bound { trail } => trail,
        };

        while self.remaining > 0 {
            self.decoder.decode_next(self.data, &mut self.pos)?;
            self.remaining -= 1;
            let accepted = self
                .filter
                .as_ref()
                .map_or(true, |f| f.matches_values(self.decoder.values()));
            if accepted {
                if self.remaining == 0 {
                    self.state = CursorState::Exhausted { trail };
                }
                return Ok(true);
            }
        }
        self.state = CursorState::Exhausted { trail };
        Ok(false)
    }

    /// Next event of the trail, `None` once exhausted
    ///
    /// With a filter attached, non-matching events are skipped. Keeps
    /// returning `None` after exhaustion until the cursor is rebound.
    ///
    /// # Errors
    ///
    /// - [`Error::Unbound`] if the cursor was never bound
    /// - [`Error::CorruptFormat`] if the trail fails to decode
    pub fn next_event(&mut self) -> Result<Option<Event<'s>>> {
        if !self.advance()? {
            return Ok(None);
        }
        Ok(Some(Event::from_values(
            self.store.dictionary(),
            self.decoder.timestamp(),
            self.decoder.values(),
        )))
    }

    /// Like [`Cursor::next_event`], returning only the timestamp
    pub fn next_timestamp(&mut self) -> Result<Option<Timestamp>> {
        Ok(self.advance()?.then(|| self.decoder.timestamp()))
    }
}
