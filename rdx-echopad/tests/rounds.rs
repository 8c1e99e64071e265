//! Round lifecycle scenarios driven on the virtual clock.

use echopad::prelude::*;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::broadcast;

/// A display that remembers both its current state and every call made.
#[derive(Debug, Default)]
struct RecordingDisplay {
    lit: BTreeSet<ButtonId>,
    hovered: BTreeSet<ButtonId>,
    status: String,
    control: Option<ControlColor>,
    score: Option<u32>,
    high_score: Option<HighScoreText>,
    affordance: bool,
    affordance_calls: usize,
    theme_toggles: usize,
    highlight_log: Vec<(ButtonId, bool)>,
}

impl Display for RecordingDisplay {
    fn set_highlight(&mut self, id: ButtonId, on: bool) {
        self.highlight_log.push((id, on));
        if on {
            self.lit.insert(id);
        } else {
            self.lit.remove(&id);
        }
    }

    fn set_status_text(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn set_control_color(&mut self, color: ControlColor) {
        self.control = Some(color);
    }

    fn set_score_text(&mut self, score: u32) {
        self.score = Some(score);
    }

    fn set_high_score_text(&mut self, high_score: HighScoreText) {
        self.high_score = Some(high_score);
    }

    fn set_cursor_affordance(&mut self, enabled: bool) {
        self.affordance = enabled;
        self.affordance_calls += 1;
    }

    fn toggle_theme(&mut self) {
        self.theme_toggles += 1;
    }

    fn set_hover(&mut self, id: ButtonId, on: bool) {
        if on {
            self.hovered.insert(id);
        } else {
            self.hovered.remove(&id);
        }
    }
}

type Session = GameSession<RecordingDisplay, MemoryStore>;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn seeded_config() -> GameConfig {
    GameConfig {
        seed: Some(2024),
        ..Default::default()
    }
}

fn session_with(config: GameConfig, store: MemoryStore) -> Session {
    GameSession::new(config, RecordingDisplay::default(), store).unwrap()
}

fn session() -> Session {
    session_with(seeded_config(), MemoryStore::new())
}

/// Fires timers until the player's turn begins.
fn play_back(session: &mut Session) {
    while !session.awaiting_input() {
        let deadline = session
            .next_deadline()
            .expect("playback stalled before the player's turn");
        session.advance_to(deadline);
    }
}

fn reproduce(session: &mut Session) {
    let sequence = session.sequence().to_vec();
    for id in sequence {
        assert!(session.target_clicked(id));
    }
}

/// A pad that differs from `id`.
fn other_than(id: ButtonId) -> ButtonId {
    ButtonId((id.0 + 1) % 4)
}

fn win_round(session: &mut Session) {
    play_back(session);
    reproduce(session);
    assert_eq!(session.phase(), RoundPhase::Celebrating);
    let pause = session.config().timing.success_pause();
    session.advance(pause);
}

fn drain(events: &mut broadcast::Receiver<GameEvent>) -> Vec<GameEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

#[test]
fn exact_reproduction_wins_the_round() {
    let mut session = session();
    assert!(session.control_clicked());
    assert_eq!(session.sequence().len(), 4);

    play_back(&mut session);
    reproduce(&mut session);

    assert_eq!(session.streak(), 1);
    assert_eq!(session.difficulty(), 5);
    assert_eq!(session.speed_up(), ms(10));
    assert_eq!(session.display().score, Some(1));
    assert_eq!(session.display().status, "CORRECT");
    assert_eq!(session.display().control, Some(ControlColor::Success));
}

#[test]
fn success_starts_next_round_after_pause() {
    let mut session = session();
    session.control_clicked();
    play_back(&mut session);
    reproduce(&mut session);

    session.advance(ms(749));
    assert_eq!(session.phase(), RoundPhase::Celebrating);
    session.advance(ms(1));
    assert_eq!(session.phase(), RoundPhase::Observing);
    assert_eq!(session.round(), 2);
    assert_eq!(session.sequence().len(), 5);
    assert!(session.entered().is_empty());
    assert_eq!(session.current_delay(), ms(740));
}

#[test]
fn mismatch_on_third_input_fails_immediately() {
    let mut session = session();
    let mut events = session.subscribe_events();
    session.control_clicked();
    play_back(&mut session);

    let sequence = session.sequence().to_vec();
    session.target_clicked(sequence[0]);
    session.target_clicked(sequence[1]);
    session.target_clicked(other_than(sequence[2]));

    assert_eq!(session.phase(), RoundPhase::Cooldown);
    assert!(!session.awaiting_input());
    assert_eq!(session.entered().len(), 3);
    assert_eq!(session.streak(), 0);
    assert_eq!(session.difficulty(), 4);
    assert_eq!(session.speed_up(), Duration::ZERO);
    assert_eq!(session.display().status, "RESTART");
    assert_eq!(session.display().control, Some(ControlColor::Failure));
    // Nothing beaten, nothing written.
    assert_eq!(session.store().raw(), None);

    // A fourth click is not taken.
    assert!(!session.target_clicked(sequence[3]));

    let finished = drain(&mut events).into_iter().find_map(|e| match e {
        GameEvent::RoundFinished { outcome, .. } => Some(outcome),
        _ => None,
    });
    assert_eq!(finished, Some(RoundOutcome::Failure { position: 2 }));
}

#[test]
fn failure_after_a_streak_saves_the_high_score() {
    let store = MemoryStore::with_raw("1");
    let mut session = session_with(seeded_config(), store.clone());
    session.control_clicked();
    win_round(&mut session);
    win_round(&mut session);
    assert_eq!(session.streak(), 2);
    // Not persisted until the streak is lost.
    assert_eq!(store.raw().as_deref(), Some("1"));

    play_back(&mut session);
    assert_eq!(session.sequence().len(), 6);
    let sequence = session.sequence().to_vec();
    session.target_clicked(sequence[0]);
    session.target_clicked(sequence[1]);
    session.target_clicked(other_than(sequence[2]));

    assert_eq!(session.streak(), 0);
    assert_eq!(session.high_score(), 2);
    assert_eq!(store.raw().as_deref(), Some("2"));
    assert_eq!(session.display().high_score, Some(HighScoreText::Value(2)));
    assert_eq!(session.difficulty(), 4);
}

#[test]
fn high_score_and_theme_events_carry_the_session_time() {
    let mut session = session();
    let mut events = session.subscribe_events();
    session.control_clicked();
    win_round(&mut session);

    play_back(&mut session);
    let failed_at = session.now();
    let first = session.sequence()[0];
    session.target_clicked(other_than(first));
    session.advance(ms(300));
    session.theme_toggle_clicked();

    let stamped: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::HighScoreSaved { high_score, at } => Some((format!("saved {}", high_score), at)),
            GameEvent::ThemeToggled { theme, at } => Some((format!("{:?}", theme), at)),
            _ => None,
        })
        .collect();
    assert_eq!(
        stamped,
        vec![
            ("saved 1".to_string(), failed_at),
            ("Night".to_string(), failed_at + ms(300)),
        ]
    );
}

#[test]
fn mismatch_on_last_input_is_still_a_failure() {
    let mut session = session();
    session.control_clicked();
    play_back(&mut session);
    let sequence = session.sequence().to_vec();
    for &id in &sequence[..3] {
        session.target_clicked(id);
    }
    session.target_clicked(other_than(sequence[3]));
    assert_eq!(session.phase(), RoundPhase::Cooldown);
    assert_eq!(session.streak(), 0);
}

#[test]
fn stored_high_score_is_shown_at_startup() {
    let session = session_with(seeded_config(), MemoryStore::with_raw("7"));
    assert_eq!(session.high_score(), 7);
    assert_eq!(session.display().high_score, Some(HighScoreText::Value(7)));
    assert_eq!(session.display().score, Some(0));
    assert_eq!(session.display().status, "START");
}

#[test]
fn absent_or_corrupted_high_score_shows_placeholder() {
    for store in [MemoryStore::new(), MemoryStore::with_raw("not a number")] {
        let session = session_with(seeded_config(), store);
        assert_eq!(session.high_score(), 0);
        assert_eq!(
            session.display().high_score,
            Some(HighScoreText::Placeholder)
        );
    }
}

#[test]
fn start_round_is_ignored_while_a_round_runs() {
    let mut session = session();
    assert!(session.start_round());
    let sequence = session.sequence().to_vec();
    let pending = session.pending_timers();

    assert!(!session.start_round());
    assert!(!session.control_clicked());
    assert_eq!(session.round(), 1);
    assert_eq!(session.sequence(), &sequence[..]);
    assert_eq!(session.pending_timers(), pending);

    play_back(&mut session);
    assert!(!session.control_clicked());
    assert_eq!(session.phase(), RoundPhase::Reproducing);
}

#[test]
fn clicks_during_playback_are_ignored() {
    let mut session = session();
    assert!(!session.target_clicked(ButtonId(0)));
    session.control_clicked();
    session.advance(ms(800));
    assert!(!session.target_clicked(ButtonId(0)));
    assert!(session.entered().is_empty());
}

#[test]
fn restart_requires_the_failure_pause_and_a_manual_click() {
    let mut session = session();
    session.control_clicked();
    play_back(&mut session);
    let first = session.sequence()[0];
    session.target_clicked(other_than(first));

    assert!(!session.control_clicked());
    session.advance(ms(1499));
    assert!(!session.round_startable());
    assert!(!session.control_clicked());

    session.advance(ms(1));
    assert!(session.round_startable());
    // No automatic restart, even much later.
    session.advance(ms(60_000));
    assert_eq!(session.phase(), RoundPhase::Ready);
    assert_eq!(session.round(), 1);

    assert!(session.control_clicked());
    assert_eq!(session.round(), 2);
    assert_eq!(session.sequence().len(), 4);
}

#[test]
fn playback_reveals_each_pad_at_the_configured_pace() {
    let mut session = session();
    let mut events = session.subscribe_events();
    session.control_clicked();
    let sequence = session.sequence().to_vec();

    session.advance(ms(749));
    assert!(session.display().lit.is_empty());
    session.advance(ms(1));
    assert_eq!(session.display().lit, BTreeSet::from([sequence[0]]));
    session.advance(ms(750));
    assert!(session.display().lit.is_empty());

    // Four pads, each on then off, every 750 ms.
    session.advance(ms(6000 - 1500 - 1));
    assert!(!session.awaiting_input());
    session.advance(ms(1));
    assert!(session.awaiting_input());
    assert!(session.display().lit.is_empty());

    let expected: Vec<_> = sequence.iter().flat_map(|&id| [(id, true), (id, false)]).collect();
    assert_eq!(session.display().highlight_log, expected);

    let revealed: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::StepRevealed { index, button, at } => Some((index, button, at)),
            _ => None,
        })
        .collect();
    let expected: Vec<_> = sequence
        .iter()
        .enumerate()
        .map(|(i, &id)| (i, id, ms(750 + 1500 * i as u64)))
        .collect();
    assert_eq!(revealed, expected);
}

#[test]
fn player_turn_updates_status_and_affordance_without_flicker() {
    let mut session = session();
    session.control_clicked();
    assert_eq!(session.display().status, "OBSERVE");
    assert_eq!(session.display().control, Some(ControlColor::Observe));
    assert_eq!(session.display().affordance_calls, 0);

    play_back(&mut session);
    assert_eq!(session.display().status, "REPEAT");
    assert_eq!(session.display().control, Some(ControlColor::Reproduce));
    assert!(session.display().affordance);
    assert_eq!(session.display().affordance_calls, 1);

    reproduce(&mut session);
    assert!(!session.display().affordance);
    assert_eq!(session.display().affordance_calls, 2);

    session.advance(ms(750));
    assert_eq!(session.phase(), RoundPhase::Observing);
    assert_eq!(session.display().affordance_calls, 2);
}

#[test]
fn clicked_pad_flashes_briefly() {
    let mut session = session();
    session.control_clicked();
    play_back(&mut session);
    let first = session.sequence()[0];

    session.target_clicked(first);
    assert!(session.display().lit.contains(&first));
    session.advance(ms(749));
    assert!(session.display().lit.contains(&first));
    session.advance(ms(1));
    assert!(!session.display().lit.contains(&first));
}

#[test]
fn pending_flashes_end_when_the_next_round_starts() {
    let mut config = seeded_config();
    config.timing.click_flash_ms = 5_000;
    let mut session = session_with(config, MemoryStore::new());
    session.control_clicked();
    play_back(&mut session);
    reproduce(&mut session);
    assert!(!session.display().lit.is_empty());

    session.advance(ms(750));
    assert_eq!(session.phase(), RoundPhase::Observing);
    assert!(session.display().lit.is_empty());
    // Only the playback timer is left.
    assert_eq!(session.pending_timers(), 1);
}

#[test]
fn extend_policy_keeps_previous_sequence() {
    let mut config = seeded_config();
    config.policy = SequencePolicy::Extend;
    let mut session = session_with(config, MemoryStore::new());
    session.control_clicked();
    let first = session.sequence().to_vec();
    win_round(&mut session);
    assert_eq!(session.sequence().len(), 5);
    assert_eq!(&session.sequence()[..4], &first[..]);
}

#[test]
fn playback_delay_never_drops_below_floor() {
    let mut config = seeded_config();
    config.timing.base_delay_ms = 100;
    config.timing.min_delay_ms = 50;
    config.timing.speed_up_step_ms = 30;
    let mut session = session_with(config, MemoryStore::new());
    let mut events = session.subscribe_events();
    session.control_clicked();
    win_round(&mut session);
    win_round(&mut session);

    let delays: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::RoundStarted { delay, .. } => Some(delay),
            _ => None,
        })
        .collect();
    assert_eq!(delays, vec![ms(100), ms(70), ms(50)]);
}

#[test]
fn hover_only_while_awaiting_input() {
    let mut session = session();
    session.pointer_entered(ButtonId(1));
    assert!(session.display().hovered.is_empty());

    session.control_clicked();
    play_back(&mut session);
    session.pointer_entered(ButtonId(1));
    assert!(session.display().hovered.contains(&ButtonId(1)));
    session.pointer_left(ButtonId(1));
    assert!(session.display().hovered.is_empty());

    session.pointer_entered(ButtonId(2));
    reproduce(&mut session);
    assert!(session.display().hovered.is_empty());
}

#[test]
fn theme_toggles_in_any_phase() {
    let mut session = session();
    session.handle_input(InputEvent::ThemeToggleClicked);
    assert_eq!(session.theme(), Theme::Night);
    session.control_clicked();
    session.handle_input(InputEvent::ThemeToggleClicked);
    assert_eq!(session.theme(), Theme::Day);
    assert_eq!(session.display().theme_toggles, 2);
}

#[test]
fn finishing_mid_streak_persists_the_streak() {
    let store = MemoryStore::new();
    let mut session = session_with(seeded_config(), store.clone());
    session.control_clicked();
    win_round(&mut session);
    win_round(&mut session);
    play_back(&mut session);

    session.finish();
    assert_eq!(store.raw().as_deref(), Some("2"));
    assert_eq!(session.pending_timers(), 0);
    assert_eq!(session.display().high_score, Some(HighScoreText::Value(2)));
}

#[test]
fn unknown_pads_are_ignored() {
    let mut session = session();
    session.control_clicked();
    play_back(&mut session);
    assert!(!session.target_clicked(ButtonId(42)));
    assert!(session.entered().is_empty());
    assert!(session.awaiting_input());
}
