use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::{GameConfig, DEFAULT_CACHE_MAX_AGE_SECS};
use crate::services::corpus::{parse_corpus, CorpusSource, LoadError};
use crate::services::store::{KeyValueStore, StoreExt};

pub const CACHE_KEY: &str = "wordrush.dictionary";

/// Persisted copy of the last successful network fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub words: Vec<String>,
    /// Epoch milliseconds of the fetch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DictionarySource {
    Cache,
    Network,
    Fallback,
}

/// Outcome of the one load a dictionary performs.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub source: DictionarySource,
    pub word_count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Why the fallback list is in use, if it is.
    pub failure: Option<LoadError>,
}

#[derive(Debug, Clone)]
pub struct DictionarySettings {
    pub min_word_length: usize,
    pub max_age: Duration,
    pub fallback_words: Vec<String>,
}

impl From<&GameConfig> for DictionarySettings {
    fn from(config: &GameConfig) -> Self {
        Self {
            min_word_length: config.min_word_length,
            max_age: config
                .cache_max_age()
                .unwrap_or_else(|| Duration::seconds(DEFAULT_CACHE_MAX_AGE_SECS)),
            fallback_words: config.fallback_words.clone(),
        }
    }
}

struct Loaded {
    words: HashSet<String>,
    report: LoadReport,
}

struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The set of legal words. Populated once, from cache, network or the
/// built-in fallback list, and never evicted afterwards.
pub struct WordDictionary {
    source: Box<dyn CorpusSource>,
    store: Arc<dyn KeyValueStore>,
    settings: DictionarySettings,
    loaded: OnceCell<Loaded>,
    loading: AtomicBool,
}

impl WordDictionary {
    pub fn new(source: Box<dyn CorpusSource>, store: Arc<dyn KeyValueStore>, settings: DictionarySettings) -> Self {
        Self {
            source,
            store,
            settings,
            loaded: OnceCell::new(),
            loading: AtomicBool::new(false),
        }
    }

    /// Load the dictionary. Overlapping callers share one attempt, and
    /// later callers get the memoized report. Always ends loaded.
    pub async fn load(&self) -> &LoadReport {
        let loaded = self
            .loaded
            .get_or_init(|| async {
                let _flag = LoadingFlag::raise(&self.loading);
                self.resolve().await
            })
            .await;
        &loaded.report
    }

    pub fn status(&self) -> LoadStatus {
        if self.loaded.initialized() {
            LoadStatus::Loaded
        } else if self.loading.load(Ordering::SeqCst) {
            LoadStatus::Loading
        } else {
            LoadStatus::Unloaded
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    pub fn report(&self) -> Option<&LoadReport> {
        self.loaded.get().map(|l| &l.report)
    }

    /// Case-insensitive membership. Always false before loading finishes.
    pub fn has_word(&self, word: &str) -> bool {
        match self.loaded.get() {
            Some(loaded) => loaded.words.contains(&word.to_lowercase()),
            None => {
                debug!("has_word('{}') queried before dictionary loaded", word);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.loaded.get().map(|l| l.words.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.loaded.get().into_iter().flat_map(|l| l.words.iter().map(String::as_str))
    }

    async fn resolve(&self) -> Loaded {
        let now = Utc::now();

        if let Some((words, fetched_at)) = self.read_cache(now) {
            info!("Dictionary loaded {} words from cache", words.len());
            return Loaded {
                report: LoadReport {
                    source: DictionarySource::Cache,
                    word_count: words.len(),
                    fetched_at: Some(fetched_at),
                    failure: None,
                },
                words,
            };
        }

        info!("Fetching corpus from {}", self.source.describe());
        let fetched = match self.source.fetch().await {
            Ok(text) => parse_corpus(&text, self.settings.min_word_length),
            Err(e) => Err(e),
        };

        match fetched {
            Ok(words) => {
                self.write_cache(&words, now);
                info!("Dictionary loaded {} words from {}", words.len(), self.source.describe());
                Loaded {
                    report: LoadReport {
                        source: DictionarySource::Network,
                        word_count: words.len(),
                        fetched_at: Some(now),
                        failure: None,
                    },
                    words,
                }
            }
            Err(e) => {
                warn!("Corpus fetch from {} failed ({}), using fallback words", self.source.describe(), e);
                let words: HashSet<String> = self
                    .settings
                    .fallback_words
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty() && w.chars().count() >= self.settings.min_word_length)
                    .collect();
                Loaded {
                    report: LoadReport {
                        source: DictionarySource::Fallback,
                        word_count: words.len(),
                        fetched_at: None,
                        failure: Some(e),
                    },
                    words,
                }
            }
        }
    }

    fn read_cache(&self, now: DateTime<Utc>) -> Option<(HashSet<String>, DateTime<Utc>)> {
        let record = self.store.get_or::<Option<CacheRecord>>(CACHE_KEY, None)?;

        let fresh = Utc
            .timestamp_millis_opt(record.timestamp)
            .single()
            .filter(|fetched_at| now - *fetched_at < self.settings.max_age);

        match fresh {
            Some(fetched_at) if !record.words.is_empty() => {
                Some((record.words.into_iter().collect(), fetched_at))
            }
            _ => {
                info!("Evicting stale dictionary cache");
                self.store.remove(CACHE_KEY);
                None
            }
        }
    }

    fn write_cache(&self, words: &HashSet<String>, now: DateTime<Utc>) {
        let mut sorted: Vec<String> = words.iter().cloned().collect();
        sorted.sort_unstable();
        let record = CacheRecord { words: sorted, timestamp: now.timestamp_millis() };
        if !self.store.put(CACHE_KEY, &record) {
            warn!("Could not cache dictionary; continuing in memory");
        }
    }
}
