use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_VOWELS: &str = "AEIOU";

/// Consonants repeated roughly in proportion to English letter frequency.
pub const DEFAULT_CONSONANTS: &str =
    "BBCCCDDDDFFGGGHHHJKKLLLLMMMNNNNNNPPPQRRRRRRSSSSSSTTTTTTTVVWWXYYZ";

pub const DEFAULT_CACHE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

pub const FALLBACK_WORDS: &[&str] = &[
    "act", "age", "aid", "air", "arc", "are", "art", "ate", "bat", "bed",
    "bet", "cab", "can", "cap", "car", "cat", "cot", "dare", "date", "dear",
    "den", "die", "dot", "ear", "eat", "era", "pace", "pair", "pat", "pea",
    "pear", "pie", "pit", "pot", "race", "rat", "read", "rate", "rice", "ripe",
    "rope", "rose", "sat", "sea", "seat", "set", "sip", "sir", "sit", "spit",
    "star", "stop", "tap", "tea", "tear", "tie", "tip", "toe", "top", "trap",
    "tree", "trip", "at", "is", "it", "on", "or", "so", "to", "crate",
    "react", "trace", "pirate", "parties", "captor", "operatic",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("vowel count {vowels} exceeds pool size {pool}")]
    TooManyVowels { vowels: usize, pool: usize },
    #[error("pool size must be positive")]
    EmptyPool,
    #[error("{0} alphabet is empty")]
    EmptyAlphabet(&'static str),
    #[error("min word length {min} exceeds max word length {max}")]
    LengthRange { min: usize, max: usize },
    #[error("score table is empty")]
    EmptyScores,
    #[error("round duration must be positive")]
    ZeroDuration,
    #[error("clock tick must be positive")]
    ZeroTick,
    #[error("min word length must be at least 1")]
    ZeroMinLength,
    #[error("cache max age {0}s is out of range")]
    CacheAge(i64),
}

/// Settings fixed for the lifetime of a game; never renegotiated mid-round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub round_seconds: u32,
    pub tick_millis: u64,
    pub pool_size: usize,
    pub vowel_count: usize,
    pub min_word_length: usize,
    pub max_word_length: usize,
    pub vowels: String,
    pub consonants: String,
    /// Points by word length. Longer words score as the longest entry.
    pub scores: BTreeMap<usize, u32>,
    pub cache_max_age_secs: i64,
    pub fallback_words: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_seconds: 60,
            tick_millis: 1000,
            pool_size: 10,
            vowel_count: 3,
            min_word_length: 2,
            max_word_length: 10,
            vowels: DEFAULT_VOWELS.to_string(),
            consonants: DEFAULT_CONSONANTS.to_string(),
            scores: [(2, 1), (3, 2), (4, 4), (5, 6), (6, 9), (7, 12), (8, 16)]
                .into_iter()
                .collect(),
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            fallback_words: FALLBACK_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl GameConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&text)?;
        info!("Loaded game config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.vowel_count > self.pool_size {
            return Err(ConfigError::TooManyVowels { vowels: self.vowel_count, pool: self.pool_size });
        }
        if self.vowel_count > 0 && self.vowel_chars().is_empty() {
            return Err(ConfigError::EmptyAlphabet("vowel"));
        }
        if self.vowel_count < self.pool_size && self.consonant_chars().is_empty() {
            return Err(ConfigError::EmptyAlphabet("consonant"));
        }
        if self.min_word_length == 0 {
            return Err(ConfigError::ZeroMinLength);
        }
        if self.min_word_length > self.max_word_length {
            return Err(ConfigError::LengthRange { min: self.min_word_length, max: self.max_word_length });
        }
        if self.scores.is_empty() {
            return Err(ConfigError::EmptyScores);
        }
        if self.round_seconds == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.tick_millis == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.cache_max_age().is_none() {
            return Err(ConfigError::CacheAge(self.cache_max_age_secs));
        }
        Ok(())
    }

    /// The cache age limit, or `None` when negative or too large for chrono.
    pub fn cache_max_age(&self) -> Option<chrono::Duration> {
        if self.cache_max_age_secs < 0 {
            return None;
        }
        chrono::Duration::try_seconds(self.cache_max_age_secs)
    }

    pub fn vowel_chars(&self) -> Vec<char> {
        alphabet(&self.vowels)
    }

    pub fn consonant_chars(&self) -> Vec<char> {
        alphabet(&self.consonants)
    }
}

fn alphabet(letters: &str) -> Vec<char> {
    letters
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(|c| c.to_uppercase())
        .collect()
}
