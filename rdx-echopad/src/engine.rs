//! The async driver that runs a `GameSession` on the tokio clock.

use crate::display::Display;
use crate::events::{GameEvent, InputEvent};
use crate::session::GameSession;
use crate::store::HighScoreStore;
use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, trace};

const INPUT_CHANNEL_CAPACITY: usize = 64;

/// Owns a session and feeds it input events and clock time.
///
/// The session lives inside a single task, so no locking is needed: every
/// click and every timer firing is processed one after another.
pub struct GameEngine<D: Display, S: HighScoreStore> {
    session: GameSession<D, S>,
    input_rx: mpsc::Receiver<InputEvent>,
    shutdown_rx: broadcast::Receiver<()>,
}

/// A cloneable handle to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    input_tx: mpsc::Sender<InputEvent>,
    event_sender: broadcast::Sender<GameEvent>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<D: Display, S: HighScoreStore> GameEngine<D, S> {
    /// Wraps a session and returns the handle used to talk to it.
    pub fn new(session: GameSession<D, S>) -> (Self, EngineHandle) {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = EngineHandle {
            input_tx,
            event_sender: session.event_sender(),
            shutdown_tx,
        };
        let engine = Self {
            session,
            input_rx,
            shutdown_rx,
        };
        (engine, handle)
    }

    /// Runs until a shutdown is requested or every handle is dropped.
    ///
    /// Returns the finished session so callers can inspect the final state.
    pub async fn run(mut self) -> GameSession<D, S> {
        info!("GameEngine starting up...");
        let epoch = Instant::now();
        loop {
            let deadline = self.session.next_deadline().map(|due| epoch + due);
            tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => break,
                input = self.input_rx.recv() => match input {
                    Some(event) => {
                        self.session.advance_to(epoch.elapsed());
                        trace!("Input received: {:?}", event);
                        self.session.handle_input(event);
                    }
                    None => break,
                },
                _ = sleep_until(deadline) => {
                    self.session.advance_to(epoch.elapsed());
                }
            }
        }
        self.session.finish();
        info!("GameEngine has shut down.");
        self.session
    }

    /// Spawns `run` onto the tokio runtime.
    pub fn spawn(self) -> JoinHandle<GameSession<D, S>>
    where
        D: Send + 'static,
        S: Send + 'static,
    {
        tokio::spawn(self.run())
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl EngineHandle {
    /// Delivers an input event to the engine.
    pub async fn send(&self, event: InputEvent) -> Result<()> {
        self.input_tx
            .send(event)
            .await
            .context("The game engine is no longer running")
    }

    /// Subscribes to the `GameEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.event_sender.subscribe()
    }

    /// Asks the engine to finish the session and stop.
    pub fn shutdown(&self) {
        self.shutdown_tx.send(()).ok();
    }
}
