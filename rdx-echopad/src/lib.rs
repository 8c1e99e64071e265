//! # Echopad
//!
//! A timer-driven, event-driven Simon-style memory game engine.
//!
//! The game shows a growing sequence of highlighted pads; the player repeats
//! it; every won round makes the next one longer and faster. Echopad provides
//! the round state machine and leaves drawing, storage and real time to the
//! application through small interfaces.
//!
//! ## Core Concepts
//!
//! - **GameSession**: The single object that owns all game state and
//!   implements the round lifecycle: observe, reproduce, score, repeat.
//! - **TimerQueue**: A cancellable one-shot scheduler on a virtual clock.
//!   Every pause in the game (playback steps, click flashes, post-round
//!   pauses) is a timer in this queue.
//! - **Display / HighScoreStore**: The collaborators the session writes to.
//! - **GameEngine**: Drives a session from the tokio clock and an input
//!   channel, and broadcasts strongly-typed `GameEvent`s.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use echopad::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GameConfig::default();
//!     let store = FileStore::new(config.high_score_path.clone());
//!     let session = GameSession::new(config, TracingDisplay, store)?;
//!
//!     let (engine, handle) = GameEngine::new(session);
//!     let mut events = handle.subscribe_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     let task = engine.spawn();
//!     handle.send(InputEvent::ControlClicked).await?;
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown();
//!     task.await?;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Echopad";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod display;
pub mod engine;
pub mod events;
pub mod session;
pub mod store;
pub mod time;

/// A prelude module for easy importing of the most common Echopad types.
pub mod prelude {
    pub use crate::common::{ButtonId, TimerId};
    pub use crate::components::sequence::SequencePolicy;
    pub use crate::components::tracker::HighScoreText;
    pub use crate::config::GameConfig;
    pub use crate::display::{ControlColor, Display, Theme, TracingDisplay};
    pub use crate::engine::{EngineHandle, GameEngine};
    pub use crate::events::{GameEvent, InputEvent, RoundOutcome};
    pub use crate::session::{GameSession, RoundPhase};
    pub use crate::store::{FileStore, HighScoreStore, MemoryStore};
}
