use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::services::dictionary::WordDictionary;
use crate::services::letters::LetterPool;
use crate::services::scoring::ScoreTable;
use crate::utils::normalize_word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    Idle,
    Active,
    Ended,
}

/// Why a submission was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    RoundInactive,
    TooShort,
    AlreadyFound,
    AlreadyInvalid,
    CannotForm,
    NotInDictionary,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::RoundInactive => "The round is not running",
            Rejection::TooShort => "Too short",
            Rejection::AlreadyFound => "Already found",
            Rejection::AlreadyInvalid => "Already tried",
            Rejection::CannotForm => "Can't be made from these letters",
            Rejection::NotInDictionary => "Not a word",
        }
    }
}

/// Outcome of one submission. `word` is the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Submission {
    Accepted { word: String, points: u32 },
    Rejected { word: String, reason: Rejection },
}

impl Submission {
    pub fn word(&self) -> &str {
        match self {
            Submission::Accepted { word, .. } | Submission::Rejected { word, .. } => word,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted { .. })
    }
}

/// Collaborators a submission is checked against.
pub struct Referee<'a> {
    pub pool: &'a LetterPool,
    pub dictionary: &'a WordDictionary,
    pub scores: &'a ScoreTable,
    pub min_word_length: usize,
    pub max_word_length: usize,
}

/// Per-round progress. Owns the found and invalid sets and the score.
#[derive(Debug, Clone)]
pub struct RoundState {
    phase: RoundPhase,
    found: Vec<String>,
    found_set: HashSet<String>,
    invalid: HashSet<String>,
    score: u32,
    time_remaining: u32,
    character: Option<String>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            phase: RoundPhase::Idle,
            found: Vec::new(),
            found_set: HashSet::new(),
            invalid: HashSet::new(),
            score: 0,
            time_remaining: 0,
            character: None,
            started_at: None,
            ended_at: None,
        }
    }
}

impl RoundState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to idle with empty sets. The selected character survives.
    pub fn reset(&mut self) {
        let character = self.character.take();
        *self = Self { character, ..Self::default() };
    }

    /// Idle or ended to active. Returns false if already active.
    pub fn start(&mut self, now: DateTime<Utc>, duration: u32) -> bool {
        if self.phase == RoundPhase::Active {
            return false;
        }
        let character = self.character.take();
        *self = Self {
            phase: RoundPhase::Active,
            time_remaining: duration,
            started_at: Some(now),
            character,
            ..Self::default()
        };
        true
    }

    /// Active to ended. Any other phase is left alone, so the end time is
    /// stamped once.
    pub fn end(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != RoundPhase::Active {
            return false;
        }
        self.phase = RoundPhase::Ended;
        self.ended_at = Some(now);
        true
    }

    pub fn submit(&mut self, raw: &str, referee: &Referee<'_>) -> Submission {
        let word = normalize_word(raw, referee.max_word_length);
        let reject = |word: String, reason: Rejection| {
            debug!("Rejected '{}': {:?}", word, reason);
            Submission::Rejected { word, reason }
        };

        if self.phase != RoundPhase::Active {
            return reject(word, Rejection::RoundInactive);
        }
        if word.chars().count() < referee.min_word_length {
            return reject(word, Rejection::TooShort);
        }
        if self.found_set.contains(&word) {
            return reject(word, Rejection::AlreadyFound);
        }
        if self.invalid.contains(&word) {
            return reject(word, Rejection::AlreadyInvalid);
        }
        if !referee.pool.can_form_word(&word) {
            self.invalid.insert(word.clone());
            return reject(word, Rejection::CannotForm);
        }
        if !referee.dictionary.has_word(&word) {
            self.invalid.insert(word.clone());
            return reject(word, Rejection::NotInDictionary);
        }

        let points = referee.scores.score(word.chars().count());
        self.found_set.insert(word.clone());
        self.found.push(word.clone());
        self.score += points;
        debug!("Accepted '{}' for {} points", word, points);
        Submission::Accepted { word, points }
    }

    pub fn set_time_remaining(&mut self, seconds: u32) {
        if self.phase == RoundPhase::Active {
            self.time_remaining = seconds;
        }
    }

    /// Ended rounds are frozen; returns false and leaves them untouched.
    pub fn select_character(&mut self, id: impl Into<String>) -> bool {
        if self.phase == RoundPhase::Ended {
            return false;
        }
        self.character = Some(id.into());
        true
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    /// Found words in the order they were accepted.
    pub fn found(&self) -> &[String] {
        &self.found
    }

    pub fn invalid(&self) -> &HashSet<String> {
        &self.invalid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn character(&self) -> Option<&str> {
        self.character.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::services::corpus::testing::StaticCorpus;
    use crate::services::dictionary::DictionarySettings;
    use crate::services::store::MemoryStore;
    use chrono::Duration;
    use std::sync::Arc;

    struct Fixture {
        pool: LetterPool,
        dictionary: WordDictionary,
        scores: ScoreTable,
    }

    impl Fixture {
        async fn new() -> Self {
            let config = GameConfig::default();
            let dictionary = WordDictionary::new(
                Box::new(StaticCorpus::new("cat\nact\nscrap\npirates\neerie\ntrace\n")),
                Arc::new(MemoryStore::new()),
                DictionarySettings::from(&config),
            );
            dictionary.load().await;
            Self {
                pool: LetterPool::new("SCRATEPIOL".chars().collect()),
                dictionary,
                scores: ScoreTable::new(config.scores),
            }
        }

        fn referee(&self) -> Referee<'_> {
            Referee {
                pool: &self.pool,
                dictionary: &self.dictionary,
                scores: &self.scores,
                min_word_length: 2,
                max_word_length: 10,
            }
        }
    }

    fn active() -> RoundState {
        let mut round = RoundState::new();
        assert!(round.start(Utc::now(), 60));
        round
    }

    #[tokio::test]
    async fn test_accepts_formable_dictionary_word() {
        let fixture = Fixture::new().await;
        let mut round = active();

        let result = round.submit("CAT", &fixture.referee());

        assert_eq!(result, Submission::Accepted { word: "cat".to_string(), points: 2 });
        assert_eq!(round.found(), &["cat".to_string()]);
        assert_eq!(round.score(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_word_is_already_found() {
        let fixture = Fixture::new().await;
        let mut round = active();
        round.submit("cat", &fixture.referee());

        let result = round.submit(" Cat ", &fixture.referee());

        assert_eq!(result, Submission::Rejected { word: "cat".to_string(), reason: Rejection::AlreadyFound });
        assert_eq!(round.score(), 2);
        assert_eq!(round.found().len(), 1);
    }

    #[tokio::test]
    async fn test_unformable_word_is_recorded_invalid() {
        let fixture = Fixture::new().await;
        let mut round = active();

        let result = round.submit("EERIE", &fixture.referee());

        assert_eq!(result, Submission::Rejected { word: "eerie".to_string(), reason: Rejection::CannotForm });
        assert!(round.invalid().contains("eerie"));

        let again = round.submit("eerie", &fixture.referee());
        assert_eq!(again, Submission::Rejected { word: "eerie".to_string(), reason: Rejection::AlreadyInvalid });
    }

    #[tokio::test]
    async fn test_unknown_word_is_not_in_dictionary() {
        let fixture = Fixture::new().await;
        let mut round = active();

        let result = round.submit("opts", &fixture.referee());

        assert_eq!(result, Submission::Rejected { word: "opts".to_string(), reason: Rejection::NotInDictionary });
        assert!(round.invalid().contains("opts"));
        assert_eq!(round.score(), 0);
    }

    #[tokio::test]
    async fn test_short_and_inactive_rejections_do_not_mutate() {
        let fixture = Fixture::new().await;
        let mut idle = RoundState::new();
        assert_eq!(
            idle.submit("cat", &fixture.referee()),
            Submission::Rejected { word: "cat".to_string(), reason: Rejection::RoundInactive }
        );

        let mut round = active();
        let result = round.submit("c!", &fixture.referee());
        assert_eq!(result, Submission::Rejected { word: "c".to_string(), reason: Rejection::TooShort });
        assert!(round.invalid().is_empty());
        assert!(round.found().is_empty());
    }

    #[tokio::test]
    async fn test_score_is_sum_of_found_words() {
        let fixture = Fixture::new().await;
        let mut round = active();
        for word in ["cat", "act", "scrap", "pirates", "trace", "zzz"] {
            round.submit(word, &fixture.referee());
        }
        let expected: u32 = round.found().iter().map(|w| fixture.scores.score(w.len())).sum();
        assert_eq!(round.score(), expected);
        assert!(round.found().iter().all(|w| !round.invalid().contains(w)));
    }

    #[test]
    fn test_end_stamps_once() {
        let mut round = active();
        let first = Utc::now();
        assert!(round.end(first));
        assert!(!round.end(first + Duration::seconds(5)));
        assert_eq!(round.ended_at(), Some(first));
        assert_eq!(round.phase(), RoundPhase::Ended);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut round = active();
        round.select_character("fox");
        round.end(Utc::now());

        round.reset();
        let once = format!("{:?}", round);
        round.reset();
        assert_eq!(format!("{:?}", round), once);
        assert_eq!(round.phase(), RoundPhase::Idle);
        assert!(round.started_at().is_none());
        assert_eq!(round.character(), Some("fox"));
    }

    #[test]
    fn test_ended_round_ignores_character_selection() {
        let mut round = active();
        assert!(round.select_character("fox"));
        round.end(Utc::now());

        assert!(!round.select_character("owl"));
        assert_eq!(round.character(), Some("fox"));

        round.reset();
        assert!(round.select_character("owl"));
        assert_eq!(round.character(), Some("owl"));
    }

    #[test]
    fn test_time_only_tracked_while_active() {
        let mut round = active();
        round.set_time_remaining(12);
        assert_eq!(round.time_remaining(), 12);
        round.end(Utc::now());
        round.set_time_remaining(3);
        assert_eq!(round.time_remaining(), 12);
    }
}
