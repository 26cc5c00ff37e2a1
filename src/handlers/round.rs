use actix_web::{get, post, put, web, HttpResponse, Responder};
use log::info;

use crate::models::{AppState, ErrorResponse, SubmitRequest, SubmitResponse};
use crate::services::game::GameError;
use crate::services::round::Submission;

fn conflict(error: GameError) -> HttpResponse {
    HttpResponse::Conflict().json(ErrorResponse { error: error.to_string() })
}

#[get("/round")]
pub async fn get_round(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.game.snapshot())
}

#[post("/round/start")]
pub async fn start_round(data: web::Data<AppState>) -> impl Responder {
    match data.game.start_round().await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => conflict(e),
    }
}

#[post("/round/submit")]
pub async fn submit_word(data: web::Data<AppState>, body: web::Json<SubmitRequest>) -> impl Responder {
    let submission = data.game.submit(&body.word);
    let message = match &submission {
        Submission::Accepted { points, .. } => format!("+{}", points),
        Submission::Rejected { reason, .. } => reason.message().to_string(),
    };
    HttpResponse::Ok().json(SubmitResponse {
        submission,
        message,
        score: data.game.snapshot().score,
    })
}

#[post("/round/shuffle")]
pub async fn shuffle(data: web::Data<AppState>) -> impl Responder {
    match data.game.shuffle() {
        Ok(_) => HttpResponse::Ok().json(data.game.snapshot()),
        Err(e) => conflict(e),
    }
}

#[post("/round/pause")]
pub async fn pause(data: web::Data<AppState>) -> impl Responder {
    match data.game.pause() {
        Ok(()) => HttpResponse::Ok().json(data.game.snapshot()),
        Err(e) => conflict(e),
    }
}

#[post("/round/resume")]
pub async fn resume(data: web::Data<AppState>) -> impl Responder {
    match data.game.resume() {
        Ok(()) => HttpResponse::Ok().json(data.game.snapshot()),
        Err(e) => conflict(e),
    }
}

#[post("/round/end")]
pub async fn end_round(data: web::Data<AppState>) -> impl Responder {
    match data.game.end_round() {
        Some(summary) => HttpResponse::Ok().json(summary),
        None => conflict(GameError::RoundNotActive),
    }
}

#[post("/round/reset")]
pub async fn reset_round(data: web::Data<AppState>) -> impl Responder {
    data.game.reset();
    HttpResponse::Ok().json(data.game.snapshot())
}

#[put("/round/character/{id}")]
pub async fn select_character(data: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    let id = id.into_inner();
    info!("Character selected: {}", id);
    data.game.select_character(&id);
    HttpResponse::Ok().json(data.game.snapshot())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_round)
        .service(start_round)
        .service(submit_word)
        .service(shuffle)
        .service(pause)
        .service(resume)
        .service(end_round)
        .service(reset_round)
        .service(select_character);
}
