//! One-shot normalization-parameter builder. Run after a backfill and
//! quarterly thereafter.

use anyhow::anyhow;
use sqlx::postgres::PgPoolOptions;

use stressmap_backend::config::AppConfig;
use stressmap_backend::jobs::normalization_job;
use stressmap_backend::logging::{self, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_logging(LoggingConfig::from_env()).map_err(|e| anyhow!(e.to_string()))?;

    let config = AppConfig::from_env().map_err(|e| anyhow!(e))?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    normalization_job::build_all(&pool).await?;

    tracing::info!("normalization build finished");
    Ok(())
}
