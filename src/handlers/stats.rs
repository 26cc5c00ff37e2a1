use actix_web::{get, web, HttpResponse, Responder};

use crate::models::{AppState, StatsResponse};

#[get("/stats")]
pub async fn get_stats(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(StatsResponse {
        stats: data.game.stats(),
        last_round: data.game.last_summary(),
    })
}
