use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::{country_queries, observation_queries};
use crate::errors::AppError;
use crate::external::{parallel, Sources};
use crate::jobs::backfill::polite_delay;
use crate::jobs::daily_pipeline_job::PARALLEL_MARKET_ISO2;
use crate::models::ObservationUpsert;
use crate::services::indicators::rolling_std_log_returns;
use crate::services::rate_limiter::RateLimiter;

const FX_VOL_WINDOW: usize = 30;

/// Full-history FX closes plus the rolling 30-day volatility, one batch
/// per country. The parallel-market gap only exists as a live quote, so
/// it is attached to the latest row alone.
pub async fn run(pool: &PgPool, sources: &Sources, limiter: &RateLimiter) -> Result<(), AppError> {
    let countries = country_queries::fetch_all(pool).await?;
    let today = Utc::now().date_naive();

    for country in &countries {
        let _guard = limiter.acquire().await;
        let series = match sources.fx.daily_history(&country.currency).await {
            Ok(series) => series,
            Err(e) => {
                warn!("fx history failed for {}: {}", country.iso2, e);
                continue;
            }
        };

        let closes: Vec<f64> = series.iter().map(|p| p.close).collect();
        let vols = rolling_std_log_returns(&closes, FX_VOL_WINDOW);

        let mut rows: Vec<ObservationUpsert> = series
            .iter()
            .zip(vols)
            .map(|(point, vol)| ObservationUpsert {
                fx_close: Some(point.close),
                fx_vol: vol,
                ..ObservationUpsert::new(country.id, point.date)
            })
            .collect();

        // drop anything the provider reports beyond our run date
        rows.retain(|row| row.date <= today);

        if country.iso2 == PARALLEL_MARKET_ISO2 {
            if let (Some(last), Ok(rate)) =
                (rows.last_mut(), sources.parallel.latest_rate().await)
            {
                last.parallel_gap =
                    last.fx_close.and_then(|official| parallel::gap_pct(rate, official));
            }
        }
        observation_queries::upsert_batch(pool, &rows).await?;
        info!("fx backfill: {} rows for {}", rows.len(), country.iso2);

        polite_delay().await;
    }
    Ok(())
}
