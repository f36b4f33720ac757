use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::services::scoreboard_service;
use crate::state::AppState;

/// Responses are safe to cache for an hour; the pipeline writes once a
/// day.
const CACHE_CONTROL_VALUE: &str = "public, s-maxage=3600, stale-while-revalidate=600";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_scoreboard))
        .route("/:code/history", get(get_history))
}

async fn get_scoreboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    info!("GET /api/public/stress - Building scoreboard");
    let entries = scoreboard_service::current_scoreboard(&state.pool)
        .await
        .map_err(|e| {
            error!("Failed to build scoreboard: {}", e);
            e
        })?;
    Ok((
        [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
        Json(entries),
    ))
}

async fn get_history(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let code = code.to_uppercase();
    info!("GET /api/public/stress/{}/history", code);
    match scoreboard_service::country_history(&state.pool, &code)
        .await
        .map_err(|e| {
            error!("Failed to build history for {}: {}", code, e);
            e
        })? {
        Some(points) => Ok((
            [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
            Json(points),
        )),
        None => Err(AppError::NotFound(format!("Unknown country code {code}"))),
    }
}
