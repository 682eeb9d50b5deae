//! Per-trail event encoding
//!
//! A trail is a run of events, each encoded as:
//!
//! ```text
//! varint  timestamp delta   (first event: relative to the store's min timestamp)
//! varint  changed count     (fields whose value differs from the previous event)
//! changed × (varint field index, varint value index)
//! ```
//!
//! Field state starts out all-empty (value index 0) at the head of every
//! trail, so a trail decodes independently of its neighbours.

use super::varint::{decode_varint, decode_varint_u32, encode_varint};
use trailstore_core::{Error, Result, Timestamp};

/// Encodes the events of one trail at a time
#[derive(Debug)]
pub struct TrailEncoder {
    base_timestamp: Timestamp,
    previous_timestamp: Timestamp,
    state: Vec<u32>,
    changed: Vec<(usize, u32)>,
}

impl TrailEncoder {
    /// Create an encoder for `field_count` user fields
    pub fn new(base_timestamp: Timestamp, field_count: usize) -> Self {
        Self {
            base_timestamp,
            previous_timestamp: base_timestamp,
            state: vec![0; field_count],
            changed: Vec::with_capacity(field_count),
        }
    }

    /// Reset the delta state before the first event of a new trail.
    pub fn begin_trail(&mut self) {
        self.previous_timestamp = self.base_timestamp;
        self.state.iter_mut().for_each(|v| *v = 0);
    }

    /// Append one event to `out`
    ///
    /// Events must arrive in non-decreasing timestamp order, and `values`
    /// must hold one value index per user field.
    pub fn encode_event(
        &mut self,
        timestamp: Timestamp,
        values: &[u32],
        out: &mut Vec<u8>,
    ) -> Result<()> {
        if values.len() != self.state.len() {
            return Err(Error::Encoding(format!(
                "event has {} values for {} fields",
                values.len(),
                self.state.len()
            )));
        }
        let delta = timestamp.checked_sub(self.previous_timestamp).ok_or_else(|| {
            Error::Encoding(format!(
                "timestamp {} precedes {} within a trail",
                timestamp, self.previous_timestamp
            ))
        })?;

        self.changed.clear();
        for (index, (&value, current)) in values.iter().zip(self.state.iter_mut()).enumerate() {
            if value != *current {
                *current = value;
                self.changed.push((index, value));
            }
        }

        encode_varint(delta, out);
        encode_varint(self.changed.len() as u64, out);
        for &(index, value) in &self.changed {
            encode_varint(index as u64, out);
            encode_varint(value as u64, out);
        }
        self.previous_timestamp = timestamp;
        Ok(())
    }
}

/// Decoder state carried from one event of a trail to the next
///
/// Owns the value buffer so callers can rebind to another trail without
/// reallocating.
#[derive(Debug, Clone, Default)]
pub struct EventState {
    timestamp: Timestamp,
    values: Vec<u32>,
}

impl EventState {
    /// Create a state for `field_count` user fields
    pub fn new(field_count: usize) -> Self {
        Self {
            timestamp: 0,
            values: vec![0; field_count],
        }
    }

    /// Rewind to the head of a trail.
    pub fn reset(&mut self, base_timestamp: Timestamp) {
        self.timestamp = base_timestamp;
        self.values.iter_mut().for_each(|v| *v = 0);
    }

    /// Timestamp of the last decoded event
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Value index per user field of the last decoded event
    #[inline]
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Decode the event starting at `*pos`, advancing past it.
    pub fn decode_next(&mut self, data: &[u8], pos: &mut usize) -> Result<()> {
        let delta = decode_varint(data, pos)?;
        self.timestamp = self
            .timestamp
            .checked_add(delta)
            .ok_or_else(|| Error::corrupt("timestamp delta overflows"))?;

        let changed = decode_varint(data, pos)?;
        if changed > self.values.len() as u64 {
            return Err(Error::corrupt(format!(
                "event changes {} of {} fields",
                changed,
                self.values.len()
            )));
        }
        for _ in 0..changed {
            let index = decode_varint(data, pos)? as usize;
            let value = decode_varint_u32(data, pos)?;
            let slot = self
                .values
                .get_mut(index)
                .ok_or_else(|| Error::corrupt(format!("field index {} out of range", index)))?;
            *slot = value;
        }
        Ok(())
    }
}

/// Forward reader over the raw events of one trail
///
/// Yields timestamps and value indexes without touching the dictionary.
#[derive(Debug)]
pub struct EventReader<'a> {
    data: &'a [u8],
    pos: usize,
    remaining: u64,
    state: EventState,
}

impl<'a> EventReader<'a> {
    /// Create a reader over an encoded trail of `events` events
    pub fn new(data: &'a [u8], events: u64, base_timestamp: Timestamp, field_count: usize) -> Self {
        let mut state = EventState::new(field_count);
        state.reset(base_timestamp);
        Self {
            data,
            pos: 0,
            remaining: events,
            state,
        }
    }

    /// Decode the next event, returning `false` once the trail is consumed.
    pub fn advance(&mut self) -> Result<bool> {
        if self.remaining == 0 {
            return Ok(false);
        }
        self.state.decode_next(self.data, &mut self.pos)?;
        self.remaining -= 1;
        if self.remaining == 0 && self.pos != self.data.len() {
            return Err(Error::corrupt(format!(
                "{} trailing bytes after last event",
                self.data.len() - self.pos
            )));
        }
        Ok(true)
    }

    /// Timestamp of the current event
    pub fn timestamp(&self) -> Timestamp {
        self.state.timestamp()
    }

    /// Value indexes of the current event
    pub fn values(&self) -> &[u32] {
        self.state.values()
    }

    /// Events not yet decoded
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}
