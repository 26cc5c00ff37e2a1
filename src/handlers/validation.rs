use actix_web::{get, web, HttpResponse, Responder};
use log::info;

use crate::models::AppState;

fn check_word_logic(data: &web::Data<AppState>, word: &str) -> HttpResponse {
    let dictionary = data.game.dictionary();
    if !dictionary.is_loaded() {
        return HttpResponse::ServiceUnavailable().body("Dictionary still loading");
    }

    if !dictionary.has_word(word) {
        info!("Invalid word queried: {}", word.to_lowercase());
        return HttpResponse::NotFound().finish();
    }

    info!("Valid word queried: {}", word.to_uppercase());
    HttpResponse::Ok().body(format!("Valid word: {}", word.to_uppercase()))
}

#[get("/word/{word}")]
pub async fn check_word(data: web::Data<AppState>, word: web::Path<String>) -> impl Responder {
    check_word_logic(&data, &word.into_inner())
}
