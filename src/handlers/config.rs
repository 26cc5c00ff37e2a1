use actix_web::{get, web, HttpResponse, Responder};
use log::info;

use crate::models::{AppState, ConfigResponse, DictionaryInfo};

#[get("/config")]
pub async fn get_config(data: web::Data<AppState>) -> impl Responder {
    let dictionary = data.game.dictionary();
    let config = data.game.config();

    info!(
        "Serving config: {} letters ({} vowels), {}s rounds, {} words",
        config.pool_size,
        config.vowel_count,
        config.round_seconds,
        dictionary.len()
    );

    HttpResponse::Ok().json(ConfigResponse {
        config,
        dictionary: DictionaryInfo {
            status: dictionary.status(),
            source: dictionary.report().map(|r| r.source),
            word_count: dictionary.len(),
        },
    })
}
