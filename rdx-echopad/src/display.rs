//! The display surface the game draws on.
//!
//! The game only ever writes to the display. Front-ends implement `Display`
//! for whatever they render to: a terminal, a log, a test recorder.

use crate::common::ButtonId;
use crate::components::tracker::HighScoreText;

/// Colour of the central control, one per game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlColor {
    /// Waiting for the player to start a round.
    Idle,
    /// The sequence is being shown (yellow).
    Observe,
    /// The player's turn (light blue).
    Reproduce,
    /// The round was reproduced correctly (green).
    Success,
    /// The round was failed (red).
    Failure,
}

/// Day or night colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Day,
    Night,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Day => Theme::Night,
            Theme::Night => Theme::Day,
        }
    }
}

/// Status lines shown on the control.
pub mod status {
    pub const START: &str = "START";
    pub const OBSERVE: &str = "OBSERVE";
    pub const REPRODUCE: &str = "REPEAT";
    pub const SUCCESS: &str = "CORRECT";
    pub const FAILURE: &str = "RESTART";
}

pub trait Display {
    /// Turns a pad's highlight on or off.
    fn set_highlight(&mut self, id: ButtonId, on: bool);

    fn set_status_text(&mut self, text: &str);

    fn set_control_color(&mut self, color: ControlColor);

    fn set_score_text(&mut self, score: u32);

    fn set_high_score_text(&mut self, high_score: HighScoreText);

    /// Shows or hides the "pads are clickable" affordance.
    fn set_cursor_affordance(&mut self, enabled: bool);

    fn toggle_theme(&mut self);

    /// Hover feedback while the player is expected to click.
    fn set_hover(&mut self, _id: ButtonId, _on: bool) {}
}

/// A display that only logs what it is asked to draw.
///
/// Useful for headless runs where the `GameEvent` stream is the real output.
#[derive(Debug, Default)]
pub struct TracingDisplay;

impl Display for TracingDisplay {
    fn set_highlight(&mut self, id: ButtonId, on: bool) {
        tracing::trace!("highlight {} {}", id, if on { "on" } else { "off" });
    }

    fn set_status_text(&mut self, text: &str) {
        tracing::debug!("status: {}", text);
    }

    fn set_control_color(&mut self, color: ControlColor) {
        tracing::trace!("control colour: {:?}", color);
    }

    fn set_score_text(&mut self, score: u32) {
        tracing::debug!("score: {}", score);
    }

    fn set_high_score_text(&mut self, high_score: HighScoreText) {
        tracing::debug!("high score: {}", high_score);
    }

    fn set_cursor_affordance(&mut self, enabled: bool) {
        tracing::trace!("cursor affordance: {}", enabled);
    }

    fn toggle_theme(&mut self) {
        tracing::debug!("theme toggled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_toggles_back_and_forth() {
        assert_eq!(Theme::default(), Theme::Day);
        assert_eq!(Theme::Day.toggled(), Theme::Night);
        assert_eq!(Theme::Day.toggled().toggled(), Theme::Day);
    }
}
