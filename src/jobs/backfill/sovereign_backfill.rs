use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::{country_queries, observation_queries};
use crate::errors::AppError;
use crate::external::Sources;
use crate::jobs::backfill::{forward_fill_daily, history_anchor, polite_delay};
use crate::models::ObservationUpsert;

/// Monthly sovereign yields forward-filled to daily rows, with the risk
/// spread computed against the US 10-year for each day. Days where the
/// reference yield is missing get a null spread.
pub async fn run(pool: &PgPool, sources: &Sources) -> Result<(), AppError> {
    let countries = country_queries::fetch_all(pool).await?;
    let today = Utc::now().date_naive();
    let anchor = history_anchor();

    let us_10y: HashMap<NaiveDate, f64> = match sources.risk_free.daily_series(anchor).await {
        Ok(series) => series
            .into_iter()
            .filter_map(|obs| obs.value.map(|v| (obs.date, v)))
            .collect(),
        Err(e) => {
            warn!("risk-free history failed: {}", e);
            HashMap::new()
        }
    };

    for country in &countries {
        let (monthly, fallback) = match sources.sovereign.monthly_series(country, anchor).await {
            Ok(result) => result,
            Err(e) => {
                // common for the smaller economies; their spread stays null
                warn!("sovereign series unavailable for {}: {}", country.iso2, e);
                continue;
            }
        };

        let rows: Vec<ObservationUpsert> = forward_fill_daily(&monthly, today)
            .into_iter()
            .map(|(date, yield_)| {
                let rf = us_10y.get(&date).copied();
                ObservationUpsert {
                    sovereign_yield: Some(yield_),
                    us_10y: rf,
                    risk_spread: rf.map(|rf| yield_ - rf),
                    ..ObservationUpsert::new(country.id, date)
                }
            })
            .collect();

        observation_queries::upsert_batch(pool, &rows).await?;
        info!(
            "sovereign backfill: {} rows for {} (fallback: {})",
            rows.len(),
            country.iso2,
            fallback
        );

        polite_delay().await;
    }
    Ok(())
}
