use std::collections::HashSet;
use std::path::PathBuf;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use log::info;
use thiserror::Error;

/// Why the corpus could not be obtained.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("read failed: {0}")]
    Io(String),
    #[error("corpus contained no usable words")]
    Empty,
}

/// Where the newline-delimited word list comes from.
pub trait CorpusSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<String, LoadError>>;

    /// Address shown in logs.
    fn describe(&self) -> String;
}

/// Corpus served over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpCorpus {
    url: String,
    client: reqwest::Client,
}

impl HttpCorpus {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new() }
    }
}

impl CorpusSource for HttpCorpus {
    fn fetch(&self) -> BoxFuture<'_, Result<String, LoadError>> {
        async move {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| LoadError::Http(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status(status.as_u16()));
            }

            response.text().await.map_err(|e| LoadError::Http(e.to_string()))
        }
        .boxed()
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Corpus read from a local word list file (one word per line).
#[derive(Debug, Clone)]
pub struct FileCorpus {
    path: PathBuf,
}

impl FileCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CorpusSource for FileCorpus {
    fn fetch(&self) -> BoxFuture<'_, Result<String, LoadError>> {
        async move {
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| LoadError::Io(e.to_string()))
        }
        .boxed()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pick the source for an address: http(s) URLs are fetched, anything
/// else is read as a local path.
pub fn corpus_from_address(address: &str) -> Box<dyn CorpusSource> {
    if address.starts_with("http://") || address.starts_with("https://") {
        Box::new(HttpCorpus::new(address))
    } else {
        Box::new(FileCorpus::new(address))
    }
}

/// Parse newline-delimited corpus text into a set of lowercase words,
/// dropping anything shorter than `min_len`.
pub fn parse_corpus(text: &str, min_len: usize) -> Result<HashSet<String>, LoadError> {
    let words: HashSet<String> = text
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|word| !word.is_empty() && word.chars().count() >= min_len)
        .collect();

    if words.is_empty() {
        return Err(LoadError::Empty);
    }

    info!("Parsed {} corpus words (min_len {})", words.len(), min_len);
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus_normalizes_and_filters() {
        let words = parse_corpus("Cat\n  dog \r\na\n\nCAT\nzebra\n", 2).unwrap();
        assert_eq!(words.len(), 3);
        assert!(words.contains("cat"));
        assert!(words.contains("dog"));
        assert!(words.contains("zebra"));
        assert!(!words.contains("a"));
    }

    #[test]
    fn test_parse_corpus_empty_is_error() {
        assert_eq!(parse_corpus("a\nb\n\n", 2), Err(LoadError::Empty));
    }

    #[test]
    fn test_corpus_from_address() {
        assert_eq!(corpus_from_address("https://example.org/words.txt").describe(), "https://example.org/words.txt");
        assert_eq!(corpus_from_address("/usr/share/dict/words").describe(), "/usr/share/dict/words");
    }

    #[tokio::test]
    async fn test_file_corpus_missing_file_is_io_error() {
        let corpus = FileCorpus::new("/nonexistent/wordrush/words.txt");
        assert!(matches!(corpus.fetch().await, Err(LoadError::Io(_))));
    }

    #[tokio::test]
    async fn test_file_corpus_reads_file() {
        let path = std::env::temp_dir().join(format!("wordrush-corpus-{}.txt", std::process::id()));
        std::fs::write(&path, "apple\nbanana\n").unwrap();
        let text = FileCorpus::new(&path).fetch().await.unwrap();
        assert_eq!(parse_corpus(&text, 2).unwrap().len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    /// Serves `/words.txt` on an ephemeral port; every other path is a 404.
    fn serve_words(text: &'static str) -> (String, actix_web::dev::ServerHandle) {
        use actix_web::{web, App, HttpServer};

        let server = HttpServer::new(move || App::new().route("/words.txt", web::get().to(move || async move { text })))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let base = format!("http://{}", server.addrs()[0]);
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (base, handle)
    }

    #[actix_web::test]
    async fn test_http_corpus_fetches_and_maps_status() {
        let (base, server) = serve_words("cat\ndog\n");

        let text = HttpCorpus::new(format!("{}/words.txt", base)).fetch().await.unwrap();
        assert_eq!(text, "cat\ndog\n");

        let missing = HttpCorpus::new(format!("{}/missing.txt", base)).fetch().await;
        assert_eq!(missing, Err(LoadError::Status(404)));

        server.stop(true).await;
    }

    #[tokio::test]
    async fn test_http_corpus_unreachable_falls_back() {
        use crate::config::GameConfig;
        use crate::services::dictionary::{DictionarySettings, DictionarySource, WordDictionary};
        use crate::services::store::MemoryStore;
        use std::sync::Arc;

        let url = "http://127.0.0.1:1/words.txt";
        assert!(matches!(HttpCorpus::new(url).fetch().await, Err(LoadError::Http(_))));

        let dictionary = WordDictionary::new(
            Box::new(HttpCorpus::new(url)),
            Arc::new(MemoryStore::new()),
            DictionarySettings::from(&GameConfig::default()),
        );
        let report = dictionary.load().await;
        assert_eq!(report.source, DictionarySource::Fallback);
        assert!(matches!(report.failure, Some(LoadError::Http(_))));
        assert!(dictionary.has_word("cat"));
    }
}
