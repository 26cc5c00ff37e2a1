use std::collections::{HashMap, HashSet};
use rand::seq::SliceRandom;
use rand::Rng;

/// Normalize raw player input into a candidate word.
/// Trims, lowercases, drops anything that is not a letter and caps the
/// result at `max_len` characters.
pub fn normalize_word(raw: &str, max_len: usize) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(|c| c.to_lowercase())
        .take(max_len)
        .collect()
}

/// Check if a word can be formed using only the available letters.
/// Every letter occurrence in the word consumes one occurrence from
/// `letters`; comparison is case-insensitive.
pub fn can_form_word(word: &str, letters: &[char]) -> bool {
    let mut letter_counts: HashMap<char, usize> = HashMap::new();
    for ch in letters.iter().flat_map(|c| c.to_lowercase()) {
        *letter_counts.entry(ch).or_insert(0) += 1;
    }

    for ch in word.chars().flat_map(|c| c.to_lowercase()) {
        match letter_counts.get_mut(&ch) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }

    true
}

/// Count vowels and consonants in a word
pub fn count_vowels_consonants(word: &str, vowels: &[char]) -> (usize, usize) {
    let vowel_set: HashSet<char> = vowels.iter().flat_map(|c| c.to_uppercase()).collect();

    let mut vowel_count = 0;
    let mut consonant_count = 0;

    for ch in word.chars().flat_map(|c| c.to_uppercase()) {
        if ch.is_alphabetic() {
            if vowel_set.contains(&ch) {
                vowel_count += 1;
            } else {
                consonant_count += 1;
            }
        }
    }

    (vowel_count, consonant_count)
}

/// Select random items from a list, with replacement.
/// A letter repeated in `list` is proportionally more likely to be drawn.
pub fn select_random_from_list<R: Rng + ?Sized>(list: &[char], count: usize, rng: &mut R) -> Vec<char> {
    (0..count)
        .filter_map(|_| list.choose(rng).copied())
        .collect()
}

/// Bitmask of the ASCII letters present in `text`, bit 0 = 'a'.
/// Non-ASCII letters do not contribute a bit.
pub fn compute_signature(text: &str) -> u32 {
    text.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase())
        .fold(0, |sig, c| sig | 1 << (c as u32 - 'a' as u32))
}
