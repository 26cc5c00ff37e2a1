use crate::services::letters::LetterPool;
use crate::utils::{can_form_word, compute_signature};

/// Find every word that can be formed from `pool`, longest first and
/// alphabetical within a length.
pub fn find_formable_words<'a, I>(words: I, pool: &LetterPool, min_len: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let max_len = pool.len();
    let pool_text = pool.as_string();
    let pool_sig = compute_signature(&pool_text);
    let pool_ascii = pool_text.is_ascii();

    let mut found: Vec<String> = words
        .into_iter()
        .filter(|word| {
            let len = word.chars().count();
            // 1. Length (cheap)
            if len < min_len || len > max_len {
                return false;
            }
            // 2. Any letter the pool lacks rules the word out
            if pool_ascii && word.is_ascii() && compute_signature(word) & !pool_sig != 0 {
                return false;
            }
            // 3. Full multiset check
            can_form_word(word, pool.letters())
        })
        .map(str::to_string)
        .collect();

    found.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    found
}
