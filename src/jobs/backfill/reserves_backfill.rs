use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::{country_queries, observation_queries};
use crate::errors::AppError;
use crate::external::Sources;
use crate::jobs::backfill::{forward_fill_daily, history_anchor, polite_delay};
use crate::models::ObservationUpsert;
use crate::services::indicators::pct_change;

/// Months back for the ~90-day reserves change.
const CHANGE_WINDOW_MONTHS: usize = 3;

/// Monthly reserves levels forward-filled to daily rows. The 90-day
/// change is computed at monthly granularity (3 months back) before the
/// daily expansion, so every day of a month carries that month's change.
pub async fn run(pool: &PgPool, sources: &Sources) -> Result<(), AppError> {
    let countries = country_queries::fetch_all(pool).await?;
    let today = Utc::now().date_naive();
    let anchor = history_anchor();

    for country in &countries {
        let monthly = match sources.reserves.monthly_series(country, anchor).await {
            Ok(series) => series,
            Err(e) => {
                warn!("reserves series failed for {}: {}", country.iso2, e);
                continue;
            }
        };

        let changes: Vec<(chrono::NaiveDate, Option<f64>)> = monthly
            .iter()
            .enumerate()
            .map(|(i, (date, level))| {
                let baseline = (i >= CHANGE_WINDOW_MONTHS)
                    .then(|| monthly[i - CHANGE_WINDOW_MONTHS].1);
                (*date, pct_change(*level, baseline))
            })
            .collect();

        let levels_daily = forward_fill_daily(&monthly, today);
        let changes_present: Vec<(chrono::NaiveDate, f64)> = changes
            .iter()
            .filter_map(|(date, change)| change.map(|c| (*date, c)))
            .collect();
        let changes_daily = forward_fill_daily(&changes_present, today);
        let change_for = |date| {
            changes_daily
                .binary_search_by_key(&date, |(d, _)| *d)
                .ok()
                .map(|i| changes_daily[i].1)
        };

        let rows: Vec<ObservationUpsert> = levels_daily
            .into_iter()
            .map(|(date, level)| ObservationUpsert {
                reserves_level: Some(level),
                reserves_change: change_for(date),
                ..ObservationUpsert::new(country.id, date)
            })
            .collect();

        observation_queries::upsert_batch(pool, &rows).await?;
        info!("reserves backfill: {} rows for {}", rows.len(), country.iso2);

        polite_delay().await;
    }
    Ok(())
}
