use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use stressmap_backend::config::AppConfig;
use stressmap_backend::external::Sources;
use stressmap_backend::jobs::scheduler;
use stressmap_backend::logging::{self, LoggingConfig};
use stressmap_backend::state::AppState;
use stressmap_backend::app;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let sources = Arc::new(Sources::from_config(&config)?);
    let state = AppState {
        pool,
        sources,
        config: Arc::new(config.clone()),
    };

    // external cron is the primary trigger; this covers deployments
    // without one
    let _scheduler = if config.enable_scheduler {
        Some(scheduler::start(state.clone()).await?)
    } else {
        None
    };

    let app = app::create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("stressmap backend running at http://{}/", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
