//! High score persistence.
//!
//! The store holds a single integer. Anything unreadable is treated as if no
//! high score had ever been saved.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Somewhere the high score survives process restarts.
pub trait HighScoreStore {
    /// Returns the saved high score, or `None` when absent or corrupted.
    fn load(&self) -> Option<u32>;

    /// Saves a new high score.
    fn save(&mut self, high_score: u32) -> Result<()>;
}

/// Parses a stored value, trimming surrounding whitespace.
fn parse_stored(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

/// Keeps the high score as plain text in a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileStore {
    fn load(&self) -> Option<u32> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No high score file at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Could not read high score from {}: {}", self.path.display(), e);
                return None;
            }
        };
        let parsed = parse_stored(&raw);
        if parsed.is_none() {
            warn!(
                "Ignoring corrupted high score {:?} in {}",
                raw.trim(),
                self.path.display()
            );
        }
        parsed
    }

    fn save(&mut self, high_score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(&self.path, high_score.to_string())
            .with_context(|| format!("Failed to write high score: {}", self.path.display()))
    }
}

/// An in-memory store holding the raw stored text.
///
/// Clones share the same slot, so a test can keep one handle while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `raw`, which need not be a valid number.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The raw text currently stored.
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&self) -> Option<u32> {
        let raw = self.raw()?;
        let parsed = parse_stored(&raw);
        if parsed.is_none() {
            warn!("Ignoring corrupted high score {:?}", raw);
        }
        parsed
    }

    fn save(&mut self, high_score: u32) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("high score slot is poisoned"))?;
        *slot = Some(high_score.to_string());
        Ok(())
    }
}
