use actix_web::{web, App, HttpServer};
use clap::{Arg, Command};
use log::{debug, error, info, warn};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use wordrush::handlers::{config, round, stats, validation};
use wordrush::models::AppState;
use wordrush::services::corpus::corpus_from_address;
use wordrush::services::dictionary::{DictionarySettings, WordDictionary};
use wordrush::services::store::{JsonFileStore, KeyValueStore, MemoryStore};
use wordrush::{Game, GameConfig};

// Function to initialize logging
fn init_logging(log_file: Option<&String>) -> io::Result<()> {
    if let Some(file) = log_file {
        let log_output = OpenOptions::new().create(true).append(true).open(file)?;

        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(log_output)))
            .init();
    } else {
        env_logger::init();
    }
    Ok(())
}

fn load_config(path: Option<&String>, round_seconds: Option<&u32>) -> io::Result<GameConfig> {
    let mut config = match path {
        Some(path) => GameConfig::from_file(Path::new(path))?,
        None => GameConfig::default(),
    };
    if let Some(&seconds) = round_seconds {
        config.round_seconds = seconds;
    }
    config
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    Ok(config)
}

fn log_events(game: &Game) {
    let mut events = game.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => debug!("event {}", json),
                    Err(e) => warn!("Unencodable event {:?}: {}", event, e),
                },
                Err(RecvError::Lagged(skipped)) => warn!("Event log skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let matches = Command::new("wordrushd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Timed word-formation game served to a local player")
        .arg(
            Arg::new("listen-host")
                .long("listen-host")
                .num_args(1)
                .default_value("127.0.0.1:2345")
                .help("Specify the listen address (e.g., 127.0.0.1:2345)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .num_args(1)
                .help("Specify a log file path (if omitted, logs to stderr)"),
        )
        .arg(
            Arg::new("corpus")
                .long("corpus")
                .num_args(1)
                .default_value("./share/words.txt")
                .help("Word list URL (http/https) or file path, one word per line"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .num_args(1)
                .help("JSON file for cached words and stats (in memory if omitted)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .num_args(1)
                .help("JSON game config file"),
        )
        .arg(
            Arg::new("round-seconds")
                .long("round-seconds")
                .num_args(1)
                .value_parser(clap::value_parser!(u32))
                .help("Override the round duration"),
        )
        .get_matches();

    init_logging(matches.get_one::<String>("log-file"))?;

    let config = load_config(matches.get_one::<String>("config"), matches.get_one::<u32>("round-seconds"))
        .map_err(|e| {
            error!("Invalid configuration: {}", e);
            e
        })?;

    let listen_host = matches
        .get_one::<String>("listen-host")
        .cloned()
        .unwrap_or_else(|| "127.0.0.1:2345".to_string());
    let corpus = matches
        .get_one::<String>("corpus")
        .cloned()
        .unwrap_or_else(|| "./share/words.txt".to_string());

    let store: Arc<dyn KeyValueStore> = match matches.get_one::<String>("store") {
        Some(path) => {
            info!("Using store file {}", path);
            Arc::new(JsonFileStore::open(path))
        }
        None => Arc::new(MemoryStore::new()),
    };

    let dictionary = Arc::new(WordDictionary::new(
        corpus_from_address(&corpus),
        store.clone(),
        DictionarySettings::from(&config),
    ));
    let game = Game::new(config, dictionary.clone(), store)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // Warm the dictionary so the first round starts without waiting.
    tokio::spawn(async move {
        let report = dictionary.load().await;
        info!("Dictionary ready: {} words from {:?}", report.word_count, report.source);
    });
    log_events(&game);

    let shared_state = web::Data::new(AppState { game });

    info!("Listening on {}", listen_host);
    HttpServer::new(move || {
        App::new()
            .app_data(shared_state.clone())
            .service(config::get_config)
            .service(validation::check_word)
            .service(stats::get_stats)
            .configure(round::configure)
    })
    .bind(&listen_host)?
    .run()
    .await
}
