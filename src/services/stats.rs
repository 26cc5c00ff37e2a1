use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::services::store::{KeyValueStore, StoreExt};

pub const STATS_KEY: &str = "wordrush.stats";
pub const BEST_SCORE_KEY: &str = "wordrush.bestScore";

/// Totals across completed rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub games_played: u64,
    pub total_score: u64,
    pub total_words_found: u64,
    pub average_score: u64,
    pub best_score: u64,
}

impl SessionStats {
    /// Read stats from the store. Missing or malformed records start fresh.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut stats: SessionStats = store.get_or(STATS_KEY, SessionStats::default());
        let best: u64 = store.get_or(BEST_SCORE_KEY, 0);
        stats.best_score = stats.best_score.max(best);
        stats
    }

    /// Fold one finished round in. Returns true when it set a new best.
    pub fn record_round(&mut self, score: u32, words_found: usize) -> bool {
        let score = u64::from(score);
        self.games_played += 1;
        self.total_score += score;
        self.total_words_found += words_found as u64;
        self.average_score = self.total_score / self.games_played;

        let new_best = score > self.best_score;
        if new_best {
            self.best_score = score;
        }
        new_best
    }

    /// Write back. A failed write leaves these stats in memory only.
    pub fn persist(&self, store: &dyn KeyValueStore) -> bool {
        let saved = store.put(STATS_KEY, self) && store.put(BEST_SCORE_KEY, &self.best_score);
        if saved {
            info!("Saved stats after {} games", self.games_played);
        } else {
            warn!("Could not persist stats; keeping them in memory");
        }
        saved
    }
}
