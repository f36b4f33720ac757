//! One-shot historical backfill: `backfill <family>` where family is
//! fx | inflation | sovereign | reserves | crypto | all.

use anyhow::anyhow;
use sqlx::postgres::PgPoolOptions;

use stressmap_backend::config::AppConfig;
use stressmap_backend::external::Sources;
use stressmap_backend::jobs::backfill::{
    crypto_backfill, fx_backfill, inflation_backfill, reserves_backfill, sovereign_backfill,
};
use stressmap_backend::logging::{self, LoggingConfig};
use stressmap_backend::services::rate_limiter::RateLimiter;

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

    let sources = Sources::from_config(&config)?;
    // Alpha Vantage's 5 req/min free tier is the binding quota
    let limiter = RateLimiter::new(1, 5);

    let family = std::env::args().nth(1).unwrap_or_else(|| "all".to_string());
    match family.as_str() {
        "fx" => fx_backfill::run(&pool, &sources, &limiter).await?,
        "inflation" => inflation_backfill::run(&pool, &sources).await?,
        "sovereign" => sovereign_backfill::run(&pool, &sources).await?,
        "reserves" => reserves_backfill::run(&pool, &sources).await?,
        "crypto" => crypto_backfill::run(&pool, &sources).await?,
        "all" => {
            fx_backfill::run(&pool, &sources, &limiter).await?;
            inflation_backfill::run(&pool, &sources).await?;
            sovereign_backfill::run(&pool, &sources).await?;
            reserves_backfill::run(&pool, &sources).await?;
            crypto_backfill::run(&pool, &sources).await?;
        }
        other => {
            return Err(anyhow!(
                "unknown source family '{other}' (expected fx|inflation|sovereign|reserves|crypto|all)"
            ));
        }
    }

    tracing::info!("backfill '{}' finished", family);
    Ok(())
}
