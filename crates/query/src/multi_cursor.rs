//! Time-ordered merge over many cursors
//!
//! [`MultiCursor`] performs a k-way merge of bound cursors, returning their
//! events in non-decreasing timestamp order in batches. Each source keeps at
//! most one decoded event pending, so memory stays proportional to the
//! number of cursors plus the batch size.
//!
//! Ties on timestamp go to the cursor that came first in the input list.

use crate::cursor::Cursor;
use crate::event::Event;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;
use trailstore_core::{Error, Result, Timestamp};

/// An event tagged with the position of the cursor it came from
#[derive(Debug, Clone)]
pub struct MergedEvent<'s> {
    /// Index of the source cursor in the list given to [`MultiCursor::new`]
    pub source: usize,
    /// The event itself
    pub event: Event<'s>,
}

/// k-way timestamp merge of bound cursors
#[derive(Debug)]
pub struct MultiCursor<'s> {
    cursors: Vec<Cursor<'s>>,
    pending: Vec<Option<Event<'s>>>,
    heap: BinaryHeap<Reverse<(Timestamp, usize)>>,
    primed: bool,
}

impl<'s> MultiCursor<'s> {
    /// Merge `cursors`, which must all be bound
    ///
    /// Exhausted cursors are accepted and contribute nothing. Filters
    /// attached to the cursors keep applying.
    ///
    /// # Errors
    ///
    /// [`Error::Unbound`] if any cursor was never bound.
    pub fn new(cursors: Vec<Cursor<'s>>) -> Result<Self> {
        if cursors.iter().any(|c| c.trail().is_none()) {
            return Err(Error::Unbound);
        }
        let count = cursors.len();
        Ok(Self {
            cursors,
            pending: (0..count).map(|_| None).collect(),
            heap: BinaryHeap::with_capacity(count),
            primed: false,
        })
    }

    /// Number of source cursors
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Check if there are no source cursors
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Source cursors, in input order
    pub fn cursors(&self) -> &[Cursor<'s>] {
        &self.cursors
    }

    /// Give the source cursors back
    pub fn into_cursors(self) -> Vec<Cursor<'s>> {
        self.cursors
    }

    fn refill(&mut self, source: usize) -> Result<()> {
        if let Some(event) = self.cursors[source].next_event()? {
            self.heap.push(Reverse((event.timestamp(), source)));
            self.pending[source] = Some(event);
        }
        Ok(())
    }

    fn prime(&mut self) -> Result<()> {
        for source in 0..self.cursors.len() {
            self.refill(source)?;
        }
        self.primed = true;
        debug!(
            sources = self.cursors.len(),
            live = self.heap.len(),
            "Primed multi-cursor merge"
        );
        Ok(())
    }

    /// Next events in timestamp order, at most `max_size` of them
    ///
    /// Returns an empty batch once every source is exhausted.
    pub fn next_batch(&mut self, max_size: usize) -> Result<Vec<MergedEvent<'s>>> {
        if !self.primed {
            self.prime()?;
        }

        let mut batch = Vec::with_capacity(max_size.min(1024));
        while batch.len() < max_size {
            let Some(Reverse((_, source))) = self.heap.pop() else {
                break;
            };
            if let Some(event) = self.pending[source].take() {
                batch.push(MergedEvent { source, event });
            }
            self.refill(source)?;
        }
        Ok(batch)
    }

    /// Rewind the merge and every source cursor to the start of its trail
    pub fn reset(&mut self) -> Result<()> {
        self.heap.clear();
        self.pending.iter_mut().for_each(|p| *p = None);
        for cursor in &mut self.cursors {
            if let Some(trail) = cursor.trail() {
                cursor.bind(trail)?;
            }
        }
        self.primed = false;
        Ok(())
    }
}
