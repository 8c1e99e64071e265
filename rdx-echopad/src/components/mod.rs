//! Contains the building blocks of a round.
//!
//! Each component is a small piece of plain state with no knowledge of time
//! or rendering. The `GameSession` owns one of each and wires them together
//! with its timer queue and display.

pub mod matcher;
pub mod playback;
pub mod sequence;
pub mod tracker;
