use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::services::dictionary::{DictionarySource, LoadStatus};
use crate::services::game::{Game, RoundSummary};
use crate::services::round::Submission;
use crate::services::stats::SessionStats;

/// Application state shared across all handlers
pub struct AppState {
    pub game: Game,
}

#[derive(Serialize)]
pub struct DictionaryInfo {
    pub status: LoadStatus,
    pub source: Option<DictionarySource>,
    pub word_count: usize,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub config: GameConfig,
    pub dictionary: DictionaryInfo,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub word: String,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    #[serde(flatten)]
    pub submission: Submission,
    pub message: String,
    pub score: u32,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub stats: SessionStats,
    pub last_round: Option<RoundSummary>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
