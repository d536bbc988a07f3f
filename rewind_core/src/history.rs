use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::config::RewindError;
use crate::snapshot::Snapshot;

/// Bounded, newest-first record of one body's recent snapshots.
///
/// Recording past capacity drops the oldest entry; rewinding drains from the
/// newest end. The capacity is never zero, so occupancy is always defined.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Snapshot>,
    capacity: NonZeroUsize,
}

impl HistoryBuffer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Number of fixed ticks covered by `record_seconds` of history.
    pub fn capacity_for(
        record_seconds: f64,
        tick_seconds: f64,
    ) -> Result<NonZeroUsize, RewindError> {
        if !(record_seconds.is_finite() && record_seconds > 0.0) {
            return Err(RewindError::NonPositiveRecordSeconds(record_seconds));
        }
        if !(tick_seconds.is_finite() && tick_seconds > 0.0) {
            return Err(RewindError::NonPositiveTick(tick_seconds));
        }
        let slots = (record_seconds / tick_seconds).round();
        if !slots.is_finite() || slots > usize::MAX as f64 {
            return Err(RewindError::ZeroCapacity {
                record_seconds,
                tick_seconds,
            });
        }
        NonZeroUsize::new(slots as usize).ok_or(RewindError::ZeroCapacity {
            record_seconds,
            tick_seconds,
        })
    }

    pub fn record(&mut self, snapshot: Snapshot) {
        self.entries.push_front(snapshot);
        self.entries.truncate(self.capacity.get());
    }

    pub fn pop_newest(&mut self) -> Option<Snapshot> {
        self.entries.pop_front()
    }

    pub fn peek_newest(&self) -> Option<&Snapshot> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Shrinking keeps the newest entries.
    pub fn set_capacity(&mut self, capacity: NonZeroUsize) {
        self.capacity = capacity;
        self.entries.truncate(capacity.get());
    }

    pub fn occupancy_ratio(&self) -> f64 {
        (self.entries.len() as f64 / self.capacity.get() as f64).clamp(0.0, 1.0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}
