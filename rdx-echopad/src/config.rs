//! Defines all configuration structures for the game.
//!
//! These structs are designed to be deserialized with `serde`, usually from a
//! TOML file layered under `ECHOPAD_*` environment overrides. Every field has
//! a default, so an empty source yields the classic four-pad game.

use crate::common::ButtonId;
use crate::components::sequence::SequencePolicy;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment variable overrides, e.g.
/// `ECHOPAD_TIMING__BASE_DELAY_MS=500`.
pub const ENV_PREFIX: &str = "ECHOPAD";

/// The top-level configuration for a `GameSession`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// The fixed set of selectable pads.
    pub buttons: Vec<ButtonConfig>,

    /// Playback pacing and post-round pauses.
    pub timing: TimingConfig,

    /// Sequence length progression.
    pub difficulty: DifficultyConfig,

    /// Whether each round regenerates or extends the previous sequence.
    pub policy: SequencePolicy,

    /// Seed for the sequence generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// Where `FileStore` keeps the high score.
    pub high_score_path: PathBuf,
}

/// Defines a single pad.
#[derive(Debug, Clone, Deserialize)]
pub struct ButtonConfig {
    pub id: ButtonId,
    /// A human-readable label, used by terminal front-ends.
    pub label: String,
}

/// Timing values, all in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Playback highlight duration and gap before any speed-up.
    pub base_delay_ms: u64,
    /// Floor for the playback delay once the speed-up outgrows the base.
    pub min_delay_ms: u64,
    /// Speed-up gained per successful round.
    pub speed_up_step_ms: u64,
    /// Upper bound of the speed-up accumulator.
    pub speed_up_cap_ms: u64,
    /// How long a clicked pad stays lit.
    pub click_flash_ms: u64,
    /// Pause after a successful round before the next one starts.
    pub success_pause_ms: u64,
    /// Pause after a failed round before a new one may be started.
    pub failure_pause_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Sequence length of the first round and after every failure.
    pub initial_length: usize,
}

impl GameConfig {
    /// Loads the configuration from an optional TOML file, then applies
    /// environment overrides, then validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: GameConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match path {
                Some(path) => format!("Failed to load config from {}", path.display()),
                None => "Failed to load config from environment".to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the game cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.buttons.is_empty() {
            bail!("At least one button must be configured.");
        }
        let mut seen = HashSet::new();
        for button in &self.buttons {
            if !seen.insert(button.id) {
                bail!("Duplicate button id {} ('{}').", button.id, button.label);
            }
        }
        if self.difficulty.initial_length == 0 {
            bail!("difficulty.initial_length must be at least 1.");
        }
        if self.timing.base_delay_ms == 0 || self.timing.min_delay_ms == 0 {
            bail!("timing.base_delay_ms and timing.min_delay_ms must be positive.");
        }
        Ok(())
    }

    /// The button identifiers in configuration order.
    pub fn button_ids(&self) -> Vec<ButtonId> {
        self.buttons.iter().map(|b| b.id).collect()
    }

    /// Looks up a button's label.
    pub fn label_of(&self, id: ButtonId) -> Option<&str> {
        self.buttons
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.label.as_str())
    }
}

impl TimingConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn speed_up_step(&self) -> Duration {
        Duration::from_millis(self.speed_up_step_ms)
    }

    pub fn speed_up_cap(&self) -> Duration {
        Duration::from_millis(self.speed_up_cap_ms)
    }

    pub fn click_flash(&self) -> Duration {
        Duration::from_millis(self.click_flash_ms)
    }

    pub fn success_pause(&self) -> Duration {
        Duration::from_millis(self.success_pause_ms)
    }

    pub fn failure_pause(&self) -> Duration {
        Duration::from_millis(self.failure_pause_ms)
    }
}

// --- Default values ---

fn default_buttons() -> Vec<ButtonConfig> {
    ["green", "red", "yellow", "blue"]
        .iter()
        .enumerate()
        .map(|(i, label)| ButtonConfig {
            id: ButtonId(i as u8),
            label: label.to_string(),
        })
        .collect()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            buttons: default_buttons(),
            timing: TimingConfig::default(),
            difficulty: DifficultyConfig::default(),
            policy: SequencePolicy::default(),
            seed: None,
            high_score_path: PathBuf::from(".echopad_high_score"),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 750,
            min_delay_ms: 50,
            speed_up_step_ms: 10,
            speed_up_cap_ms: 800,
            click_flash_ms: 750,
            success_pause_ms: 750,
            failure_pause_ms: 1500,
        }
    }
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self { initial_length: 4 }
    }
}
