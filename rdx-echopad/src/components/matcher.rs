//! Checks the player's clicks against the round's sequence.

use crate::common::ButtonId;

/// The result of accepting one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchProgress {
    /// Correct so far, more clicks expected.
    Pending,
    /// Every position matched and the buffer is full.
    Complete,
    /// The click at `position` did not match.
    Mismatch { position: usize },
}

impl MatchProgress {
    /// `true` when the round has to be finalized.
    pub fn is_final(self) -> bool {
        !matches!(self, MatchProgress::Pending)
    }
}

/// Holds the clicks entered during the current round.
#[derive(Debug, Clone, Default)]
pub struct InputMatcher {
    buffer: Vec<ButtonId>,
}

impl InputMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the buffer at round start.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Records one click and compares it with the same position in `target`.
    ///
    /// A click arriving after the buffer is already full is ignored and
    /// reported as the final state again, so the buffer never outgrows the
    /// target.
    pub fn accept(&mut self, target: &[ButtonId], id: ButtonId) -> MatchProgress {
        if self.buffer.len() >= target.len() {
            return self.verdict(target);
        }
        self.buffer.push(id);
        let position = self.buffer.len() - 1;
        if target[position] != id {
            MatchProgress::Mismatch { position }
        } else if self.buffer.len() == target.len() {
            MatchProgress::Complete
        } else {
            MatchProgress::Pending
        }
    }

    /// Full positional comparison of the buffer against `target`.
    ///
    /// A buffer shorter than the target counts as incorrect.
    pub fn all_correct(&self, target: &[ButtonId]) -> bool {
        self.buffer.len() == target.len() && self.buffer.iter().zip(target).all(|(a, b)| a == b)
    }

    fn verdict(&self, target: &[ButtonId]) -> MatchProgress {
        match self.buffer.iter().zip(target).position(|(a, b)| a != b) {
            Some(position) => MatchProgress::Mismatch { position },
            None if self.buffer.len() == target.len() => MatchProgress::Complete,
            None => MatchProgress::Pending,
        }
    }

    pub fn entered(&self) -> &[ButtonId] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
