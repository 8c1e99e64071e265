//! Defines the events flowing into and out of a game session.
//!
//! `InputEvent`s are what a front-end delivers; `GameEvent`s are what the
//! session broadcasts so that observers (loggers, bots, shells) can follow a
//! game without touching its state.

use crate::common::ButtonId;
use crate::display::Theme;
use std::time::Duration;

/// Discrete player actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A pad was clicked.
    TargetClicked(ButtonId),
    /// The central control was clicked.
    ControlClicked,
    /// The day/night switch was clicked.
    ThemeToggleClicked,
    /// The pointer moved over a pad.
    PointerEntered(ButtonId),
    /// The pointer left a pad.
    PointerLeft(ButtonId),
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Success,
    /// The first wrong click was at `position`.
    Failure { position: usize },
}

/// Events broadcast by a `GameSession`.
///
/// Every event carries `at`, the session's virtual time when it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A new round began showing a sequence of `length` pads.
    RoundStarted {
        round: u64,
        length: usize,
        delay: Duration,
        at: Duration,
    },
    /// The pad at `index` of the sequence was highlighted.
    StepRevealed {
        index: usize,
        button: ButtonId,
        at: Duration,
    },
    /// Playback is over and the player's clicks are being accepted.
    AwaitingInput { length: usize, at: Duration },
    /// A click was accepted into the input buffer at `position`.
    InputAccepted {
        button: ButtonId,
        position: usize,
        at: Duration,
    },
    /// The round was finalized.
    RoundFinished {
        round: u64,
        outcome: RoundOutcome,
        streak: u32,
        next_length: usize,
        at: Duration,
    },
    /// A new round may be started with the control.
    ReadyForRound { at: Duration },
    /// A higher score was written to the store.
    HighScoreSaved { high_score: u32, at: Duration },
    ThemeToggled { theme: Theme, at: Duration },
}
