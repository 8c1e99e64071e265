use anyhow::Result;
use colored::{ColoredString, Colorize};
use echopad::prelude::*;
use echopad::{ENGINE_NAME, VERSION};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Chance that the bot fumbles one click of a round.
const MISTAKE_CHANCE: f64 = 0.2;
/// Time the bot takes between two clicks.
const CLICK_GAP: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // 2. Load the configuration. An optional TOML path may be given as the first argument.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = GameConfig::load(config_path.as_deref())?;
    let store = FileStore::new(config.high_score_path.clone());
    let buttons = config.button_ids();

    // 3. Create the session and the engine around it.
    let session = GameSession::new(config, TracingDisplay, store)?;
    let (engine, handle) = GameEngine::new(session);

    // 4. Spawn listeners: one logging the event stream, one playing the game.
    spawn_event_logger(handle.subscribe_events());
    spawn_autoplayer(handle.clone(), buttons);

    // 5. Run the engine until Ctrl+C.
    let task = engine.spawn();
    handle.send(InputEvent::ControlClicked).await?;
    info!("{} v{} is playing itself. Press Ctrl+C to stop.", ENGINE_NAME, VERSION);
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received.");
    handle.shutdown();
    let session = task.await?;
    info!(
        "Final streak {}, high score {}.",
        session.streak(),
        session.high_score()
    );
    Ok(())
}

/// Logs every game event, tagged by colour.
fn spawn_event_logger(mut events: broadcast::Receiver<GameEvent>) {
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("{} => {:?}", event_tag(&event), event);
        }
    });
}

fn event_tag(event: &GameEvent) -> ColoredString {
    match event {
        GameEvent::RoundStarted { .. } | GameEvent::StepRevealed { .. } => "[OBSERVE]".yellow(),
        GameEvent::AwaitingInput { .. } | GameEvent::InputAccepted { .. } => "[REPEAT]".bright_blue(),
        GameEvent::RoundFinished {
            outcome: RoundOutcome::Success,
            ..
        } => "[CORRECT]".green().bold(),
        GameEvent::RoundFinished { .. } => "[RESTART]".red().bold(),
        GameEvent::HighScoreSaved { .. } => "[HIGH SCORE]".cyan().bold(),
        GameEvent::ReadyForRound { .. } | GameEvent::ThemeToggled { .. } => "[GAME]".dimmed(),
    }
}

/// Watches the playback and clicks the sequence back, sometimes wrongly.
fn spawn_autoplayer(handle: EngineHandle, buttons: Vec<ButtonId>) {
    let mut events = handle.subscribe_events();
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        let mut shown = Vec::new();
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("[BOT] Missed {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let result = match event {
                GameEvent::RoundStarted { .. } => {
                    shown.clear();
                    Ok(())
                }
                GameEvent::StepRevealed { button, .. } => {
                    shown.push(button);
                    Ok(())
                }
                GameEvent::AwaitingInput { .. } => {
                    replay(&handle, &shown, &buttons, &mut rng).await
                }
                GameEvent::ReadyForRound { .. } => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    handle.send(InputEvent::ControlClicked).await
                }
                _ => Ok(()),
            };
            if result.is_err() {
                break;
            }
        }
    });
}

async fn replay(
    handle: &EngineHandle,
    shown: &[ButtonId],
    buttons: &[ButtonId],
    rng: &mut StdRng,
) -> Result<()> {
    if shown.is_empty() {
        return Ok(());
    }
    let fumble = rng.gen_bool(MISTAKE_CHANCE).then(|| rng.gen_range(0..shown.len()));
    for (i, &id) in shown.iter().enumerate() {
        tokio::time::sleep(CLICK_GAP).await;
        let id = match fumble {
            Some(at) if at == i => buttons.iter().copied().find(|&b| b != id).unwrap_or(id),
            _ => id,
        };
        handle.send(InputEvent::TargetClicked(id)).await?;
    }
    Ok(())
}
