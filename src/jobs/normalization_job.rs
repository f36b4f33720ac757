//! Offline builder of the per-(country, metric) p5/p95 clamp bounds the
//! scoring engine normalizes against. Run after a backfill and
//! quarterly thereafter; the daily pipeline only reads these rows.

use chrono::{Days, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::observation_queries::{self, ValueColumn};
use crate::db::{country_queries, normalization_queries};
use crate::errors::AppError;
use crate::jobs::backfill::history_anchor;
use crate::models::Metric;
use crate::services::indicators::percentile;

pub const NORMALIZATION_METHOD: &str = "p5_p95_clamped";

/// Below this many historical samples a metric is skipped; a later run
/// picks it up once more history lands.
const MIN_SAMPLES: usize = 10;

/// The crypto series is provider-limited to one year of history.
const CRYPTO_WINDOW_DAYS: u64 = 365;

fn column_for(metric: Metric) -> ValueColumn {
    match metric {
        Metric::FxVol => ValueColumn::FxVol,
        Metric::Inflation => ValueColumn::Inflation,
        Metric::RiskSpread => ValueColumn::RiskSpread,
        Metric::CryptoRatio => ValueColumn::CryptoRatio,
        Metric::ReservesChange => ValueColumn::ReservesChange,
        Metric::StablecoinPremium => ValueColumn::StablecoinPremium,
    }
}

pub async fn build_all(pool: &PgPool) -> Result<(), AppError> {
    let countries = country_queries::fetch_all(pool).await?;
    let today = Utc::now().date_naive();

    for country in &countries {
        for metric in Metric::ALL {
            let from = match metric {
                Metric::CryptoRatio => today - Days::new(CRYPTO_WINDOW_DAYS),
                _ => history_anchor(),
            };

            let samples =
                observation_queries::metric_history(pool, country.id, column_for(metric), from)
                    .await?;
            if samples.len() < MIN_SAMPLES {
                info!(
                    "skipping norms for {} {}: only {} samples",
                    country.iso2,
                    metric.name(),
                    samples.len()
                );
                continue;
            }

            let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
            let (Some(p5), Some(p95)) = (percentile(&values, 5.0), percentile(&values, 95.0))
            else {
                continue;
            };
            if p95 <= p5 {
                warn!(
                    "refusing degenerate norms for {} {}: p5 {} >= p95 {}",
                    country.iso2,
                    metric.name(),
                    p5,
                    p95
                );
                continue;
            }

            // window bounds record the exact inputs used
            let window_start = samples.first().map(|(d, _)| *d).unwrap_or(from);
            let window_end = samples.last().map(|(d, _)| *d).unwrap_or(today);

            normalization_queries::upsert(
                pool,
                country.id,
                metric.name(),
                p5,
                p95,
                NORMALIZATION_METHOD,
                window_start,
                window_end,
            )
            .await?;
            info!(
                "norms for {} {}: [{:.6}, {:.6}] over {} samples",
                country.iso2,
                metric.name(),
                p5,
                p95,
                values.len()
            );
        }
    }
    Ok(())
}
