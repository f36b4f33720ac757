use chrono::{Datelike, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::{country_queries, observation_queries};
use crate::errors::AppError;
use crate::external::Sources;
use crate::jobs::backfill::{history_anchor, polite_delay};
use crate::models::ObservationUpsert;

/// Annual CPI YoY expanded to every calendar day of its year.
/// Acceleration is the two-year delta `value[i] - value[i-2]`, null for
/// the first two years of the series.
pub async fn run(pool: &PgPool, sources: &Sources) -> Result<(), AppError> {
    let countries = country_queries::fetch_all(pool).await?;
    let today = Utc::now().date_naive();
    let anchor = history_anchor();

    for country in &countries {
        let series = match sources.inflation.annual_series(&country.iso2).await {
            Ok(series) => series,
            Err(e) => {
                warn!("inflation series failed for {}: {}", country.iso2, e);
                continue;
            }
        };

        let mut rows: Vec<ObservationUpsert> = Vec::new();
        for (i, point) in series.iter().enumerate() {
            let Some(yoy) = point.value else { continue };
            if point.year < anchor.year() {
                continue;
            }
            // two-year delta smooths single-year base effects
            let accel = (i >= 2)
                .then(|| series[i - 2].value.map(|prior| yoy - prior))
                .flatten();

            let mut day = NaiveDate::from_ymd_opt(point.year, 1, 1).unwrap_or(anchor);
            let year_end = NaiveDate::from_ymd_opt(point.year, 12, 31).unwrap_or(today);
            let end = year_end.min(today);
            while day <= end {
                rows.push(ObservationUpsert {
                    inflation_yoy: Some(yoy),
                    inflation: accel,
                    ..ObservationUpsert::new(country.id, day)
                });
                day = day + chrono::Days::new(1);
            }
        }

        observation_queries::upsert_batch(pool, &rows).await?;
        info!("inflation backfill: {} rows for {}", rows.len(), country.iso2);

        polite_delay().await;
    }
    Ok(())
}
