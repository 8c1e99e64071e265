//! Reveals the round's sequence one pad at a time.

use crate::common::ButtonId;
use std::time::Duration;

/// Computes the playback delay for a given speed-up.
///
/// The speed-up is subtracted from `base`; the result never drops below
/// `floor`, so the delay stays positive however large the accumulator gets.
pub fn step_delay(base: Duration, speed_up: Duration, floor: Duration) -> Duration {
    base.saturating_sub(speed_up).max(floor)
}

/// Where the driver is inside the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    /// Showing element `index`; `lit` tells whether its highlight is on.
    Revealing { index: usize, lit: bool },
    Finished,
}

/// What a single timer firing did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStep {
    /// The pad was highlighted. Schedule the next firing after the delay.
    Lit(ButtonId),
    /// The pad was switched off and more pads remain. Schedule the next firing.
    Unlit(ButtonId),
    /// The last pad was switched off. The sequence is fully revealed.
    Finished(ButtonId),
}

/// A stateful driver that walks a sequence: on, off, on, off...
///
/// The driver holds no timers itself. Its owner schedules a firing every
/// `delay` and feeds it back through `advance`.
#[derive(Debug, Clone)]
pub struct PlaybackDriver {
    sequence: Vec<ButtonId>,
    phase: PlaybackPhase,
    delay: Duration,
}

impl PlaybackDriver {
    pub fn new() -> Self {
        Self {
            sequence: Vec::new(),
            phase: PlaybackPhase::Idle,
            delay: Duration::ZERO,
        }
    }

    /// Starts revealing `sequence` from its first element, replacing any
    /// playback in flight. Returns the delay before the first firing, or
    /// `None` when the sequence is empty.
    pub fn start(&mut self, sequence: &[ButtonId], delay: Duration) -> Option<Duration> {
        self.sequence = sequence.to_vec();
        self.delay = delay;
        if self.sequence.is_empty() {
            self.phase = PlaybackPhase::Finished;
            return None;
        }
        self.phase = PlaybackPhase::Revealing {
            index: 0,
            lit: false,
        };
        Some(delay)
    }

    /// Processes one timer firing.
    ///
    /// Returns `None` when the driver is not revealing anything, so a stale
    /// firing can never replay a sequence.
    pub fn advance(&mut self) -> Option<PlaybackStep> {
        let PlaybackPhase::Revealing { index, lit } = self.phase else {
            return None;
        };
        let id = *self.sequence.get(index)?;

        if !lit {
            self.phase = PlaybackPhase::Revealing { index, lit: true };
            return Some(PlaybackStep::Lit(id));
        }

        if index + 1 < self.sequence.len() {
            self.phase = PlaybackPhase::Revealing {
                index: index + 1,
                lit: false,
            };
            Some(PlaybackStep::Unlit(id))
        } else {
            self.phase = PlaybackPhase::Finished;
            Some(PlaybackStep::Finished(id))
        }
    }

    /// Abandons the current playback. Returns the pad left lit, if any.
    pub fn stop(&mut self) -> Option<ButtonId> {
        let lit = match self.phase {
            PlaybackPhase::Revealing { index, lit: true } => self.sequence.get(index).copied(),
            _ => None,
        };
        self.phase = PlaybackPhase::Idle;
        lit
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, PlaybackPhase::Revealing { .. })
    }
}

impl Default for PlaybackDriver {
    fn default() -> Self {
        Self::new()
    }
}
