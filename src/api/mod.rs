use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::models::{TourBatch, TourRequest};
use crate::planner::LogProgress;
use crate::web::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/tours", post(create_tours))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: crate::VERSION,
    })
}

async fn create_tours(
    State(state): State<AppState>,
    Json(request): Json<TourRequest>,
) -> Result<Json<TourBatch>, StatusCode> {
    if request.city_list().is_empty() {
        warn!("Rejected tour request without cities");
        return Err(StatusCode::BAD_REQUEST);
    }

    info!("Planning tours for: {}", request.cities);
    let batch = state.planner.plan_tours(&request, &mut LogProgress).await;
    Ok(Json(batch))
}
