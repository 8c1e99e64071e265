//! Score, high score and difficulty bookkeeping.

use crate::config::GameConfig;
use std::time::Duration;

/// Rules for difficulty progression, taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyRules {
    pub initial_length: usize,
    pub speed_up_step: Duration,
    pub speed_up_cap: Duration,
}

impl DifficultyRules {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            initial_length: config.difficulty.initial_length,
            speed_up_step: config.timing.speed_up_step(),
            speed_up_cap: config.timing.speed_up_cap(),
        }
    }
}

/// How the high score is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighScoreText {
    /// No round has ever been won.
    Placeholder,
    Value(u32),
}

impl HighScoreText {
    pub fn from_score(high_score: u32) -> Self {
        if high_score > 0 {
            HighScoreText::Value(high_score)
        } else {
            HighScoreText::Placeholder
        }
    }
}

impl std::fmt::Display for HighScoreText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HighScoreText::Placeholder => f.write_str("-"),
            HighScoreText::Value(n) => write!(f, "{n}"),
        }
    }
}

/// Tracks the streak, the best streak and the current difficulty.
#[derive(Debug, Clone)]
pub struct ScoreTracker {
    rules: DifficultyRules,
    streak: u32,
    high_score: u32,
    length: usize,
    speed_up: Duration,
}

impl ScoreTracker {
    pub fn new(rules: DifficultyRules, stored_high_score: Option<u32>) -> Self {
        Self {
            rules,
            streak: 0,
            high_score: stored_high_score.unwrap_or(0),
            length: rules.initial_length,
            speed_up: Duration::ZERO,
        }
    }

    /// A round was reproduced correctly: longer and faster next time.
    pub fn record_success(&mut self) {
        self.streak += 1;
        self.length += 1;
        self.speed_up = (self.speed_up + self.rules.speed_up_step).min(self.rules.speed_up_cap);
    }

    /// A round was failed: back to the defaults.
    ///
    /// Returns the new high score when the lost streak beat the previous one,
    /// so the caller can persist it.
    pub fn record_failure(&mut self) -> Option<u32> {
        let raised = self.settle();
        self.streak = 0;
        self.length = self.rules.initial_length;
        self.speed_up = Duration::ZERO;
        raised
    }

    /// Raises the high score to the current streak if it is better.
    ///
    /// Used on failure and when the process ends mid-streak.
    pub fn settle(&mut self) -> Option<u32> {
        if self.streak > self.high_score {
            self.high_score = self.streak;
            Some(self.high_score)
        } else {
            None
        }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn high_score_text(&self) -> HighScoreText {
        HighScoreText::from_score(self.high_score)
    }

    /// Sequence length of the next round.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn speed_up(&self) -> Duration {
        self.speed_up
    }
}
