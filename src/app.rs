use axum::Router;
use http::Method;
use tower_http::cors::{Any, CorsLayer};

use crate::routes::{health, pipeline, stress};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    // the public API is read-only and meant to sit behind a CDN
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/public/stress", stress::router())
        .nest("/api/cron", pipeline::router())
        .with_state(state)
        .layer(cors)
}
