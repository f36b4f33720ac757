use sqlx::PgPool;
use tracing::info;

use crate::db::{country_queries, observation_queries};
use crate::errors::AppError;
use crate::external::Sources;
use crate::models::ObservationUpsert;

/// The stablecoin/BTC ratio is global: one fetch covering the
/// provider's 365-day window, replicated into every country's rows.
pub async fn run(pool: &PgPool, sources: &Sources) -> Result<(), AppError> {
    let countries = country_queries::fetch_all(pool).await?;
    let ratios = sources
        .crypto
        .ratio_history()
        .await
        .map_err(|e| AppError::External(e.to_string()))?;

    for country in &countries {
        let rows: Vec<ObservationUpsert> = ratios
            .iter()
            .map(|(date, ratio)| ObservationUpsert {
                crypto_ratio: Some(*ratio),
                ..ObservationUpsert::new(country.id, *date)
            })
            .collect();
        observation_queries::upsert_batch(pool, &rows).await?;
        info!("crypto backfill: {} rows for {}", rows.len(), country.iso2);
    }
    Ok(())
}
