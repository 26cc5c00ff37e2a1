//! Round orchestration.
//!
//! `Game` owns one round at a time and drives it from the clock. All
//! round mutation happens under a single lock, so submissions are
//! resolved one after another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{ConfigError, GameConfig};
use crate::services::clock::{ClockListener, ClockSignal, RoundClock};
use crate::services::dictionary::WordDictionary;
use crate::services::letters::{LetterGenerator, LetterPool};
use crate::services::round::{Referee, RoundPhase, RoundState, Submission};
use crate::services::scoring::ScoreTable;
use crate::services::solver::find_formable_words;
use crate::services::stats::SessionStats;
use crate::services::store::KeyValueStore;

const EVENT_CAPACITY: usize = 256;
const MISSED_WORDS_SHOWN: usize = 5;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no round has been started")]
    RoundIdle,
    #[error("round is not running")]
    RoundNotActive,
    #[error("round already running")]
    RoundActive,
}

/// Final numbers for a finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub score: u32,
    pub words_found: Vec<String>,
    pub invalid_count: usize,
    pub seconds_played: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub new_best: bool,
    pub possible_words: usize,
    pub missed_words: Vec<String>,
}

/// Signals for whatever presents the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    RoundStarted { letters: String, duration: u32 },
    Tick { remaining: u32 },
    SubmissionResult { submission: Submission },
    Shuffled { letters: String },
    Paused,
    Resumed,
    RoundEnded { summary: RoundSummary },
}

/// Read-only view of the current round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundSnapshot {
    pub phase: RoundPhase,
    pub letters: String,
    pub found: Vec<String>,
    pub invalid: Vec<String>,
    pub score: u32,
    pub time_remaining: u32,
    pub paused: bool,
    pub character: Option<String>,
    /// Chosen after the round ended; applies from the next round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_character: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

struct GameInner {
    config: GameConfig,
    generator: LetterGenerator,
    scores: ScoreTable,
    pool: LetterPool,
    round: RoundState,
    clock: RoundClock,
    stats: SessionStats,
    last_summary: Option<RoundSummary>,
    next_character: Option<String>,
    dictionary: Arc<WordDictionary>,
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<RoundEvent>,
}

fn lock(inner: &Mutex<GameInner>) -> MutexGuard<'_, GameInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GameInner {
    fn emit(&self, event: RoundEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn begin(&mut self, pool: LetterPool) -> Result<(), GameError> {
        if self.round.is_active() {
            return Err(GameError::RoundActive);
        }
        let duration = self.config.round_seconds;
        self.pool = pool;
        self.reset_round();
        self.round.start(Utc::now(), duration);
        self.clock.start(duration);

        info!("Round started with letters {} for {}s", self.pool.as_string(), duration);
        self.emit(RoundEvent::RoundStarted { letters: self.pool.as_string(), duration });
        Ok(())
    }

    fn reset_round(&mut self) {
        self.round.reset();
        if let Some(id) = self.next_character.take() {
            self.round.select_character(id);
        }
    }

    fn on_clock(&mut self, signal: ClockSignal) {
        match signal {
            ClockSignal::Tick { run, remaining } => {
                if run != self.clock.current_run() || !self.round.is_active() {
                    return;
                }
                self.round.set_time_remaining(remaining);
                self.emit(RoundEvent::Tick { remaining });
            }
            ClockSignal::Completed { run } => {
                if run == self.clock.current_run() {
                    self.finish();
                }
            }
        }
    }

    fn finish(&mut self) -> Option<RoundSummary> {
        if !self.round.is_active() {
            return None;
        }
        self.clock.stop();
        self.round.end(Utc::now());

        let possible = find_formable_words(self.dictionary.words(), &self.pool, self.config.min_word_length);
        let missed: Vec<String> = possible
            .iter()
            .filter(|w| !self.round.found().contains(*w))
            .take(MISSED_WORDS_SHOWN)
            .cloned()
            .collect();

        let new_best = self.stats.record_round(self.round.score(), self.round.found().len());
        self.stats.persist(self.store.as_ref());

        let seconds_played = match (self.round.started_at(), self.round.ended_at()) {
            (Some(start), Some(end)) => (end - start).num_seconds(),
            _ => 0,
        };
        let summary = RoundSummary {
            score: self.round.score(),
            words_found: self.round.found().to_vec(),
            invalid_count: self.round.invalid().len(),
            seconds_played,
            started_at: self.round.started_at(),
            ended_at: self.round.ended_at(),
            new_best,
            possible_words: possible.len(),
            missed_words: missed,
        };

        info!(
            "Round ended: {} points, {} of {} possible words{}",
            summary.score,
            summary.words_found.len(),
            summary.possible_words,
            if new_best { " (new best)" } else { "" }
        );
        self.last_summary = Some(summary.clone());
        self.emit(RoundEvent::RoundEnded { summary: summary.clone() });
        Some(summary)
    }

    fn snapshot(&self) -> RoundSnapshot {
        let mut invalid: Vec<String> = self.round.invalid().iter().cloned().collect();
        invalid.sort_unstable();
        RoundSnapshot {
            phase: self.round.phase(),
            letters: self.pool.as_string(),
            found: self.round.found().to_vec(),
            invalid,
            score: self.round.score(),
            time_remaining: self.round.time_remaining(),
            paused: self.clock.is_paused(),
            character: self.round.character().map(str::to_string),
            next_character: self.next_character.clone(),
            started_at: self.round.started_at(),
            ended_at: self.round.ended_at(),
        }
    }
}

/// Handle to a game. Clones share the same game.
#[derive(Clone)]
pub struct Game {
    inner: Arc<Mutex<GameInner>>,
    dictionary: Arc<WordDictionary>,
    events: broadcast::Sender<RoundEvent>,
}

impl Game {
    pub fn new(
        config: GameConfig,
        dictionary: Arc<WordDictionary>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let stats = SessionStats::load(store.as_ref());
        info!("Loaded stats: {} games played, best {}", stats.games_played, stats.best_score);

        let inner = Arc::new_cyclic(|weak: &Weak<Mutex<GameInner>>| {
            let weak = weak.clone();
            let listener: ClockListener = Arc::new(move |signal: ClockSignal| {
                if let Some(inner) = weak.upgrade() {
                    lock(&inner).on_clock(signal);
                }
            });

            Mutex::new(GameInner {
                generator: LetterGenerator::new(&config),
                scores: ScoreTable::new(config.scores.clone()),
                clock: RoundClock::new(Duration::from_millis(config.tick_millis), listener),
                pool: LetterPool::default(),
                round: RoundState::new(),
                stats,
                last_summary: None,
                next_character: None,
                dictionary: dictionary.clone(),
                store,
                events: events.clone(),
                config,
            })
        });

        Ok(Self { inner, dictionary, events })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    pub fn dictionary(&self) -> &Arc<WordDictionary> {
        &self.dictionary
    }

    pub fn config(&self) -> GameConfig {
        lock(&self.inner).config.clone()
    }

    /// Generate a pool and start the countdown. Waits for the dictionary
    /// the first time.
    pub async fn start_round(&self) -> Result<RoundSnapshot, GameError> {
        self.dictionary.load().await;

        let mut inner = lock(&self.inner);
        let pool = inner.generator.generate_random();
        inner.begin(pool)?;
        Ok(inner.snapshot())
    }

    pub fn submit(&self, raw: &str) -> Submission {
        let mut guard = lock(&self.inner);
        let inner = &mut *guard;
        let referee = Referee {
            pool: &inner.pool,
            dictionary: &inner.dictionary,
            scores: &inner.scores,
            min_word_length: inner.config.min_word_length,
            max_word_length: inner.config.max_word_length,
        };
        let submission = inner.round.submit(raw, &referee);
        inner.emit(RoundEvent::SubmissionResult { submission: submission.clone() });
        submission
    }

    /// Reorder the current letters.
    pub fn shuffle(&self) -> Result<String, GameError> {
        let mut inner = lock(&self.inner);
        if inner.round.phase() == RoundPhase::Idle {
            return Err(GameError::RoundIdle);
        }
        inner.pool.shuffle(&mut rand::thread_rng());
        let letters = inner.pool.as_string();
        debug!("Shuffled letters to {}", letters);
        inner.emit(RoundEvent::Shuffled { letters: letters.clone() });
        Ok(letters)
    }

    pub fn pause(&self) -> Result<(), GameError> {
        let inner = lock(&self.inner);
        if !inner.round.is_active() {
            return Err(GameError::RoundNotActive);
        }
        if !inner.clock.is_paused() {
            inner.clock.pause();
            inner.emit(RoundEvent::Paused);
        }
        Ok(())
    }

    pub fn resume(&self) -> Result<(), GameError> {
        let inner = lock(&self.inner);
        if !inner.round.is_active() {
            return Err(GameError::RoundNotActive);
        }
        if inner.clock.is_paused() {
            inner.clock.resume();
            inner.emit(RoundEvent::Resumed);
        }
        Ok(())
    }

    /// End the round early. `None` if no round was running.
    pub fn end_round(&self) -> Option<RoundSummary> {
        lock(&self.inner).finish()
    }

    /// Drop the current round without recording it.
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        inner.clock.stop();
        inner.reset_round();
        inner.pool = LetterPool::default();
    }

    /// Applies to the current round unless it has ended, in which case the
    /// choice waits for the next reset or start.
    pub fn select_character(&self, id: &str) {
        let mut inner = lock(&self.inner);
        if inner.round.select_character(id) {
            inner.next_character = None;
        } else {
            inner.next_character = Some(id.to_string());
        }
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        lock(&self.inner).snapshot()
    }

    pub fn stats(&self) -> SessionStats {
        lock(&self.inner).stats
    }

    pub fn last_summary(&self) -> Option<RoundSummary> {
        lock(&self.inner).last_summary.clone()
    }
}
