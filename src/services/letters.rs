use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::config::GameConfig;
use crate::utils::{can_form_word, count_vowels_consonants, select_random_from_list};

/// The letters available for one round. Shuffling reorders them; the
/// multiset itself only changes when a new pool is generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LetterPool {
    letters: Vec<char>,
}

impl LetterPool {
    pub fn new(letters: Vec<char>) -> Self {
        Self { letters: letters.into_iter().flat_map(|c| c.to_uppercase()).collect() }
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn can_form_word(&self, word: &str) -> bool {
        can_form_word(word, &self.letters)
    }

    /// Fisher-Yates reorder, same letters.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.letters.shuffle(rng);
    }

    pub fn as_string(&self) -> String {
        self.letters.iter().collect()
    }
}

/// Draws round pools: a fixed number of uniform vowels, the rest from a
/// weighted consonant string.
#[derive(Debug, Clone)]
pub struct LetterGenerator {
    pool_size: usize,
    vowel_count: usize,
    vowels: Vec<char>,
    consonants: Vec<char>,
}

impl LetterGenerator {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            vowel_count: config.vowel_count.min(config.pool_size),
            vowels: config.vowel_chars(),
            consonants: config.consonant_chars(),
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> LetterPool {
        let mut letters = select_random_from_list(&self.vowels, self.vowel_count, rng);
        letters.extend(select_random_from_list(&self.consonants, self.pool_size - self.vowel_count, rng));
        letters.shuffle(rng);
        LetterPool { letters }
    }

    pub fn generate_random(&self) -> LetterPool {
        self.generate(&mut rand::thread_rng())
    }

    /// Vowel and consonant counts of `pool` under this generator's alphabet.
    pub fn classify(&self, pool: &LetterPool) -> (usize, usize) {
        count_vowels_consonants(&pool.as_string(), &self.vowels)
    }
}
