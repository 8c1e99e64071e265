//! The round controller: one explicit object owning the whole game state.
//!
//! A `GameSession` wires the sequence generator, playback driver, input
//! matcher and score tracker to a display, a high score store and a single
//! `TimerQueue`. All state changes happen inside calls on the session, one
//! at a time: an input event, or a timer firing during `advance_to`.

use crate::common::{ButtonId, TimerId};
use crate::components::matcher::{InputMatcher, MatchProgress};
use crate::components::playback::{step_delay, PlaybackDriver, PlaybackPhase, PlaybackStep};
use crate::components::sequence::next_sequence;
use crate::components::tracker::{DifficultyRules, ScoreTracker};
use crate::config::GameConfig;
use crate::display::{status, ControlColor, Display, Theme};
use crate::events::{GameEvent, InputEvent, RoundOutcome};
use crate::store::HighScoreStore;
use crate::time::TimerQueue;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The mode of the game. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Idle between rounds; the control starts a new one.
    Ready,
    /// The sequence is being played back.
    Observing,
    /// The player's turn.
    Reproducing,
    /// Short pause after a won round; the next round starts by itself.
    Celebrating,
    /// Pause after a lost round; then back to `Ready`.
    Cooldown,
}

/// What a timer firing asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Advance the playback driver by one step.
    Playback,
    /// End the transient highlight of a clicked pad.
    FlashOff(ButtonId),
    /// Start the next round after a success.
    NextRound,
    /// Allow a new round after a failure.
    Unlock,
}

pub struct GameSession<D: Display, S: HighScoreStore> {
    config: GameConfig,
    targets: Vec<ButtonId>,
    display: D,
    store: S,
    rng: StdRng,
    timers: TimerQueue<Wake>,
    phase: RoundPhase,
    round: u64,
    sequence: Vec<ButtonId>,
    playback: PlaybackDriver,
    matcher: InputMatcher,
    tracker: ScoreTracker,
    theme: Theme,
    affordance: bool,
    hovered: BTreeSet<ButtonId>,
    flashes: BTreeMap<ButtonId, TimerId>,
    playback_timer: Option<TimerId>,
    transition_timer: Option<TimerId>,
    event_sender: broadcast::Sender<GameEvent>,
}

// Construction and accessors.
impl<D: Display, S: HighScoreStore> GameSession<D, S> {
    /// Creates a session, loads the stored high score and draws the idle
    /// screen.
    pub fn new(config: GameConfig, display: D, store: S) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let stored = store.load();
        let tracker = ScoreTracker::new(DifficultyRules::from_config(&config), stored);
        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let mut session = Self {
            targets: config.button_ids(),
            config,
            display,
            store,
            rng,
            timers: TimerQueue::new(),
            phase: RoundPhase::Ready,
            round: 0,
            sequence: Vec::new(),
            playback: PlaybackDriver::new(),
            matcher: InputMatcher::new(),
            tracker,
            theme: Theme::default(),
            affordance: false,
            hovered: BTreeSet::new(),
            flashes: BTreeMap::new(),
            playback_timer: None,
            transition_timer: None,
            event_sender,
        };

        info!(
            "Session ready with {} pads; high score {}",
            session.targets.len(),
            session.tracker.high_score_text()
        );
        session.display.set_control_color(ControlColor::Idle);
        session.display.set_status_text(status::START);
        session.render_scores();
        Ok(session)
    }

    /// Subscribes to the `GameEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.event_sender.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<GameEvent> {
        self.event_sender.clone()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// `true` only during the player's turn.
    pub fn awaiting_input(&self) -> bool {
        self.phase == RoundPhase::Reproducing
    }

    /// `true` only while idle between rounds.
    pub fn round_startable(&self) -> bool {
        self.phase == RoundPhase::Ready
    }

    /// Number of rounds started so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// The current round's target sequence.
    pub fn sequence(&self) -> &[ButtonId] {
        &self.sequence
    }

    /// The clicks entered so far this round.
    pub fn entered(&self) -> &[ButtonId] {
        self.matcher.entered()
    }

    pub fn streak(&self) -> u32 {
        self.tracker.streak()
    }

    pub fn high_score(&self) -> u32 {
        self.tracker.high_score()
    }

    /// Sequence length the next round will use.
    pub fn difficulty(&self) -> usize {
        self.tracker.length()
    }

    pub fn speed_up(&self) -> Duration {
        self.tracker.speed_up()
    }

    /// Playback delay at the current speed-up.
    pub fn current_delay(&self) -> Duration {
        step_delay(
            self.config.timing.base_delay(),
            self.tracker.speed_up(),
            self.config.timing.min_delay(),
        )
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Virtual time of the next pending timer, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

// Entry points called by the input source and the clock.
impl<D: Display, S: HighScoreStore> GameSession<D, S> {
    /// Routes an input event to its entry point.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::TargetClicked(id) => {
                self.target_clicked(id);
            }
            InputEvent::ControlClicked => {
                self.control_clicked();
            }
            InputEvent::ThemeToggleClicked => self.theme_toggle_clicked(),
            InputEvent::PointerEntered(id) => self.pointer_entered(id),
            InputEvent::PointerLeft(id) => self.pointer_left(id),
        }
    }

    /// The control was clicked: starts a round only when one is startable.
    ///
    /// Returns `true` if a round was started.
    pub fn control_clicked(&mut self) -> bool {
        if !self.round_startable() {
            debug!("Control click ignored during {:?}", self.phase);
            return false;
        }
        self.start_round()
    }

    /// Starts a new round from the idle state.
    ///
    /// Does nothing and returns `false` while a round is in progress or a
    /// post-round pause is pending.
    pub fn start_round(&mut self) -> bool {
        if self.phase != RoundPhase::Ready {
            debug!("start_round ignored during {:?}", self.phase);
            return false;
        }
        self.begin_round();
        true
    }

    /// A pad was clicked. Only accepted during the player's turn.
    ///
    /// Returns `true` if the click was taken into the input buffer.
    pub fn target_clicked(&mut self, id: ButtonId) -> bool {
        if !self.awaiting_input() {
            trace!("Click on {} ignored during {:?}", id, self.phase);
            return false;
        }
        if !self.targets.contains(&id) {
            warn!("Click on unknown pad {} ignored", id);
            return false;
        }

        let progress = self.matcher.accept(&self.sequence, id);
        let position = self.matcher.len() - 1;
        debug!("Input {} at position {}: {:?}", id, position, progress);
        self.flash(id);
        self.emit(GameEvent::InputAccepted {
            button: id,
            position,
            at: self.now(),
        });

        if progress.is_final() {
            self.finalize_round(progress);
        }
        true
    }

    /// Flips between day and night themes. Allowed at any time.
    pub fn theme_toggle_clicked(&mut self) {
        self.theme = self.theme.toggled();
        self.display.toggle_theme();
        self.emit(GameEvent::ThemeToggled {
            theme: self.theme,
            at: self.now(),
        });
    }

    /// Hover feedback on a pad, only while the player may click it.
    pub fn pointer_entered(&mut self, id: ButtonId) {
        if self.awaiting_input()
            && self.targets.contains(&id)
            && !self.flashes.contains_key(&id)
            && self.hovered.insert(id)
        {
            self.display.set_hover(id, true);
        }
    }

    pub fn pointer_left(&mut self, id: ButtonId) {
        if self.awaiting_input() && !self.flashes.contains_key(&id) && self.hovered.remove(&id) {
            self.display.set_hover(id, false);
        }
    }

    /// Moves virtual time forward by `elapsed`, firing every timer that
    /// comes due on the way.
    pub fn advance(&mut self, elapsed: Duration) {
        let target = self.now() + elapsed;
        self.advance_to(target);
    }

    /// Moves virtual time forward to `time`, firing due timers in order.
    pub fn advance_to(&mut self, time: Duration) {
        while let Some((_, wake)) = self.timers.pop_due(time) {
            trace!("Timer fired at {:?}: {:?}", self.now(), wake);
            self.on_wake(wake);
        }
        self.timers.settle_at(time);
    }

    /// Ends the session: cancels everything pending and persists a streak
    /// that beat the high score without ever being lost.
    pub fn finish(&mut self) {
        self.cancel_transition();
        self.stop_playback();
        self.end_flashes();
        if let Some(high_score) = self.tracker.settle() {
            self.persist_high_score(high_score);
            self.render_scores();
        }
        info!(
            "Session finished after {} rounds; high score {}",
            self.round,
            self.tracker.high_score_text()
        );
    }
}

// Round lifecycle.
impl<D: Display, S: HighScoreStore> GameSession<D, S> {
    fn on_wake(&mut self, wake: Wake) {
        match wake {
            Wake::Playback => {
                self.playback_timer = None;
                self.on_playback_tick();
            }
            Wake::FlashOff(id) => {
                self.flashes.remove(&id);
                self.display.set_highlight(id, false);
            }
            Wake::NextRound => {
                self.transition_timer = None;
                if self.phase == RoundPhase::Celebrating {
                    self.begin_round();
                }
            }
            Wake::Unlock => {
                self.transition_timer = None;
                if self.phase == RoundPhase::Cooldown {
                    self.phase = RoundPhase::Ready;
                    debug!("Ready for a new round");
                    self.emit(GameEvent::ReadyForRound { at: self.now() });
                }
            }
        }
    }

    fn begin_round(&mut self) {
        self.cancel_transition();
        self.stop_playback();
        self.end_flashes();
        self.clear_hover();
        self.matcher.clear();

        self.round += 1;
        self.set_affordance(false);
        self.display.set_control_color(ControlColor::Observe);
        self.display.set_status_text(status::OBSERVE);

        self.sequence = next_sequence(
            &self.sequence,
            self.config.policy,
            &self.targets,
            self.tracker.length(),
            &mut self.rng,
        );
        let delay = self.current_delay();
        self.phase = RoundPhase::Observing;
        info!(
            "Round {} started: {} pads at {:?} per step",
            self.round,
            self.sequence.len(),
            delay
        );
        self.emit(GameEvent::RoundStarted {
            round: self.round,
            length: self.sequence.len(),
            delay,
            at: self.now(),
        });

        match self.playback.start(&self.sequence, delay) {
            Some(first) => self.playback_timer = Some(self.timers.after(first, Wake::Playback)),
            None => self.enter_reproducing(),
        }
    }

    fn on_playback_tick(&mut self) {
        if self.phase != RoundPhase::Observing {
            trace!("Stale playback tick during {:?}", self.phase);
            return;
        }
        let index = match self.playback.phase() {
            PlaybackPhase::Revealing { index, .. } => index,
            _ => return,
        };
        let delay = self.playback.delay();
        match self.playback.advance() {
            Some(PlaybackStep::Lit(id)) => {
                self.display.set_highlight(id, true);
                self.emit(GameEvent::StepRevealed {
                    index,
                    button: id,
                    at: self.now(),
                });
                self.playback_timer = Some(self.timers.after(delay, Wake::Playback));
            }
            Some(PlaybackStep::Unlit(id)) => {
                self.display.set_highlight(id, false);
                self.playback_timer = Some(self.timers.after(delay, Wake::Playback));
            }
            Some(PlaybackStep::Finished(id)) => {
                self.display.set_highlight(id, false);
                self.enter_reproducing();
            }
            None => {}
        }
    }

    fn enter_reproducing(&mut self) {
        self.phase = RoundPhase::Reproducing;
        self.display.set_control_color(ControlColor::Reproduce);
        self.display.set_status_text(status::REPRODUCE);
        self.set_affordance(true);
        debug!("Awaiting {} inputs", self.sequence.len());
        self.emit(GameEvent::AwaitingInput {
            length: self.sequence.len(),
            at: self.now(),
        });
    }

    fn finalize_round(&mut self, progress: MatchProgress) {
        self.clear_hover();
        self.set_affordance(false);

        let all_correct = self.matcher.all_correct(&self.sequence);
        debug_assert_eq!(all_correct, progress == MatchProgress::Complete);

        let outcome = if all_correct {
            self.tracker.record_success();
            self.display.set_control_color(ControlColor::Success);
            self.display.set_status_text(status::SUCCESS);
            self.phase = RoundPhase::Celebrating;
            self.transition_timer = Some(
                self.timers
                    .after(self.config.timing.success_pause(), Wake::NextRound),
            );
            RoundOutcome::Success
        } else {
            let position = match progress {
                MatchProgress::Mismatch { position } => position,
                _ => self.matcher.len().saturating_sub(1),
            };
            if let Some(high_score) = self.tracker.record_failure() {
                self.persist_high_score(high_score);
            }
            self.display.set_control_color(ControlColor::Failure);
            self.display.set_status_text(status::FAILURE);
            self.phase = RoundPhase::Cooldown;
            self.transition_timer = Some(
                self.timers
                    .after(self.config.timing.failure_pause(), Wake::Unlock),
            );
            RoundOutcome::Failure { position }
        };

        self.render_scores();
        info!(
            "Round {} finished: {:?}; streak {}",
            self.round,
            outcome,
            self.tracker.streak()
        );
        self.emit(GameEvent::RoundFinished {
            round: self.round,
            outcome,
            streak: self.tracker.streak(),
            next_length: self.tracker.length(),
            at: self.now(),
        });
    }
}

// Helpers.
impl<D: Display, S: HighScoreStore> GameSession<D, S> {
    fn emit(&self, event: GameEvent) {
        self.event_sender.send(event).ok();
    }

    fn render_scores(&mut self) {
        self.display.set_score_text(self.tracker.streak());
        self.display
            .set_high_score_text(self.tracker.high_score_text());
    }

    fn persist_high_score(&mut self, high_score: u32) {
        match self.store.save(high_score) {
            Ok(()) => {
                info!("New high score {} saved", high_score);
                self.emit(GameEvent::HighScoreSaved {
                    high_score,
                    at: self.now(),
                });
            }
            Err(e) => error!("Failed to save high score {}: {:#}", high_score, e),
        }
    }

    fn flash(&mut self, id: ButtonId) {
        if let Some(previous) = self.flashes.remove(&id) {
            self.timers.cancel(previous);
        }
        if self.hovered.remove(&id) {
            self.display.set_hover(id, false);
        }
        self.display.set_highlight(id, true);
        let timer = self
            .timers
            .after(self.config.timing.click_flash(), Wake::FlashOff(id));
        self.flashes.insert(id, timer);
    }

    fn end_flashes(&mut self) {
        for (id, timer) in std::mem::take(&mut self.flashes) {
            self.timers.cancel(timer);
            self.display.set_highlight(id, false);
        }
    }

    fn clear_hover(&mut self) {
        for id in std::mem::take(&mut self.hovered) {
            self.display.set_hover(id, false);
        }
    }

    fn stop_playback(&mut self) {
        if let Some(timer) = self.playback_timer.take() {
            self.timers.cancel(timer);
        }
        if let Some(id) = self.playback.stop() {
            self.display.set_highlight(id, false);
        }
    }

    fn cancel_transition(&mut self) {
        if let Some(timer) = self.transition_timer.take() {
            self.timers.cancel(timer);
        }
    }

    /// Only touches the display when the affordance actually changes.
    fn set_affordance(&mut self, enabled: bool) {
        if self.affordance != enabled {
            self.affordance = enabled;
            self.display.set_cursor_affordance(enabled);
        }
    }
}
