use anyhow::Result;
use colored::{Color, Colorize};
use echopad::prelude::*;
use echopad::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

const LOGO_TEXT: &str = r"
              _                       _
     ___  ___| |__   ___  _ __   __ _| |
    / _ \/ __| '_ \ / _ \| '_ \ / _` |/ _` |
   |  __/ (__| | | | (_) | |_) | (_| | (_| |
    \___|\___|_| |_|\___/| .__/ \__,_|\__,_|
                         |_|
";

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

/// Draws the game as coloured lines on the terminal.
struct TerminalDisplay {
    labels: BTreeMap<ButtonId, String>,
}

impl TerminalDisplay {
    fn pad(&self, id: ButtonId) -> String {
        match self.labels.get(&id) {
            Some(label) => label.to_uppercase().color(label.as_str()).bold().to_string(),
            None => id.to_string(),
        }
    }
}

impl Display for TerminalDisplay {
    fn set_highlight(&mut self, id: ButtonId, on: bool) {
        if on {
            println!("<-- {}", self.pad(id));
        }
    }

    fn set_status_text(&mut self, text: &str) {
        println!("<-- [{}]", text.bold());
    }

    fn set_control_color(&mut self, color: ControlColor) {
        let swatch = match color {
            ControlColor::Idle => "  ".on_white(),
            ControlColor::Observe => "  ".on_yellow(),
            ControlColor::Reproduce => "  ".on_bright_blue(),
            ControlColor::Success => "  ".on_green(),
            ControlColor::Failure => "  ".on_red(),
        };
        println!("<-- {}", swatch);
    }

    fn set_score_text(&mut self, score: u32) {
        println!("<-- score: {}", score.to_string().cyan());
    }

    fn set_high_score_text(&mut self, high_score: HighScoreText) {
        println!("<-- best:  {}", high_score.to_string().cyan());
    }

    fn set_cursor_affordance(&mut self, enabled: bool) {
        if enabled {
            println!("{}", "    your turn: press the pads in order".dimmed());
        }
    }

    fn toggle_theme(&mut self) {
        println!("{}", "<-- theme switched".dimmed());
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "-----------------------------------------------------".dimmed());
    println!("{}", version_string);
    println!("{}", "-----------------------------------------------------".dimmed());
}

fn print_help() {
    println!("Available commands:");
    println!("  start                 - Starts a round (when the control allows it).");
    println!("  press <PAD>...        - Presses one or more pads, by label or number.");
    println!("  hover <PAD>           - Moves the pointer over a pad.");
    println!("  leave <PAD>           - Moves the pointer off a pad.");
    println!("  theme                 - Switches between day and night.");
    println!("  pads                  - Lists the pads.");
    println!("  exit                  - Quits the shell.");
}

/// Resolves a pad by label (case-insensitive) or numeric id.
fn parse_pad(config: &GameConfig, word: &str) -> Option<ButtonId> {
    config
        .buttons
        .iter()
        .find(|b| b.label.eq_ignore_ascii_case(word))
        .map(|b| b.id)
        .or_else(|| {
            word.parse::<u8>()
                .ok()
                .map(ButtonId)
                .filter(|id| config.label_of(*id).is_some())
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = GameConfig::load(config_path.as_deref())?;
    let display = TerminalDisplay {
        labels: config
            .buttons
            .iter()
            .map(|b| (b.id, b.label.clone()))
            .collect(),
    };
    let store = FileStore::new(config.high_score_path.clone());
    let session = GameSession::new(config.clone(), display, store)?;
    let (engine, handle) = GameEngine::new(session);

    let mut events = handle.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                GameEvent::HighScoreSaved { high_score, .. } => {
                    println!("<-- {} {}", "NEW HIGH SCORE".green().bold(), high_score);
                }
                GameEvent::ReadyForRound { .. } => {
                    println!("{}", "    type 'start' for a new round".dimmed());
                }
                other => info!("[GAME] {:?}", other),
            }
        }
    });

    info!("Spawning {} in the background...", ENGINE_NAME.cyan());
    let task = engine.spawn();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!("{} is running. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();
                let Some(command) = args.first() else {
                    continue;
                };
                match *command {
                    "start" | "s" => handle.send(InputEvent::ControlClicked).await?,
                    "press" | "p" => {
                        if args.len() < 2 {
                            println!("Usage: press <PAD>...");
                        }
                        for word in &args[1..] {
                            match parse_pad(&config, word) {
                                Some(id) => handle.send(InputEvent::TargetClicked(id)).await?,
                                None => {
                                    println!("Error: '{}' is not a pad. Use 'pads' to list them.", word);
                                    break;
                                }
                            }
                        }
                    }
                    "hover" | "leave" => match args.get(1).and_then(|w| parse_pad(&config, w)) {
                        Some(id) if *command == "hover" => {
                            handle.send(InputEvent::PointerEntered(id)).await?
                        }
                        Some(id) => handle.send(InputEvent::PointerLeft(id)).await?,
                        None => println!("Usage: {} <PAD>", command),
                    },
                    "theme" => handle.send(InputEvent::ThemeToggleClicked).await?,
                    "pads" => {
                        for button in &config.buttons {
                            println!("  {:>3}  {}", button.id.0, button.label.as_str().color(Color::from(button.label.as_str())));
                        }
                    }
                    "help" => print_help(),
                    "exit" | "quit" => break,
                    _ => println!("Unknown command: '{}'. Type 'help'.", line.trim()),
                }
            }
            Err(_) => {
                println!("Exiting echoshell...");
                break;
            }
        }
    }

    handle.shutdown();
    let session = task.await?;
    println!(
        "Final streak {}, best {}.",
        session.streak(),
        HighScoreText::from_score(session.high_score())
    );
    Ok(())
}
