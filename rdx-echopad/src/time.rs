//! The single scheduler that paces the game.
//!
//! `TimerQueue` keeps pending wake-ups on a virtual timeline measured from the
//! start of the session. Nothing here sleeps: whoever owns the queue decides
//! how virtual time advances. Tests advance it by hand; the `GameEngine`
//! advances it from the tokio clock.

use crate::common::TimerId;
use slotmap::SlotMap;
use std::time::Duration;

struct PendingTimer<W> {
    due: Duration,
    seq: u64,
    wake: W,
}

/// A cancellable one-shot timer queue on a virtual clock.
pub struct TimerQueue<W> {
    now: Duration,
    next_seq: u64,
    pending: SlotMap<TimerId, PendingTimer<W>>,
}

impl<W> TimerQueue<W> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: SlotMap::with_key(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `wake` to fire `delay` after the current virtual time.
    pub fn after(&mut self, delay: Duration, wake: W) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(PendingTimer {
            due: self.now + delay,
            seq,
            wake,
        })
    }

    /// Cancels a pending timer.
    ///
    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The virtual time of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.values().map(|t| t.due).min()
    }

    /// Removes and returns the earliest timer due at or before `limit`,
    /// moving the clock to its due time.
    ///
    /// Timers due at the same instant fire in the order they were scheduled.
    /// Returns `None` (and leaves the clock alone) when nothing is due.
    pub fn pop_due(&mut self, limit: Duration) -> Option<(TimerId, W)> {
        let id = self
            .pending
            .iter()
            .filter(|(_, t)| t.due <= limit)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(id, _)| id)?;
        let timer = self.pending.remove(id)?;
        if timer.due > self.now {
            self.now = timer.due;
        }
        Some((id, timer.wake))
    }

    /// Moves the clock forward to `time` once every due timer was popped.
    ///
    /// The clock never runs backwards.
    pub fn settle_at(&mut self, time: Duration) {
        if time > self.now {
            self.now = time;
        }
    }
}

impl<W> Default for TimerQueue<W> {
    fn default() -> Self {
        Self::new()
    }
}
