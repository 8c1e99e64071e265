//! Builds the sequence of pads the player has to reproduce.

use crate::common::ButtonId;
use rand::Rng;
use serde::Deserialize;

/// How a new round's sequence relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencePolicy {
    /// Every round draws a brand-new sequence.
    #[default]
    Regenerate,
    /// Every round keeps the previous sequence and appends the missing picks.
    Extend,
}

/// Draws `length` pads uniformly at random, with replacement.
///
/// # Panics
/// Panics if `targets` is empty.
pub fn generate<R: Rng>(targets: &[ButtonId], length: usize, rng: &mut R) -> Vec<ButtonId> {
    assert!(!targets.is_empty(), "cannot generate a sequence from an empty button set");
    (0..length)
        .map(|_| targets[rng.gen_range(0..targets.len())])
        .collect()
}

/// Produces the next round's sequence of `length` pads according to `policy`.
///
/// Under `Extend` the previous sequence is reused as a prefix (truncated when
/// the round got shorter, e.g. after a failure).
///
/// # Panics
/// Panics if `targets` is empty and a pick is needed.
pub fn next_sequence<R: Rng>(
    previous: &[ButtonId],
    policy: SequencePolicy,
    targets: &[ButtonId],
    length: usize,
    rng: &mut R,
) -> Vec<ButtonId> {
    match policy {
        SequencePolicy::Regenerate => generate(targets, length, rng),
        SequencePolicy::Extend => {
            let keep = previous.len().min(length);
            let mut sequence = previous[..keep].to_vec();
            if keep < length {
                sequence.extend(generate(targets, length - keep, rng));
            }
            sequence
        }
    }
}
