//! The daily pipeline run. One external trigger per day: guard against
//! reruns, fetch the shared global series, then walk the countries
//! sequentially (fresh FX every day, inflation/sovereign/reserves only
//! on the monthly boundary, everything else forward-filled from the
//! store), score, and upsert.
//!
//! Source failures downgrade to null metrics and an entry in the run's
//! error list; the only fatal conditions are the prelude loads.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::db::observation_queries::{self, ValueColumn};
use crate::db::{country_queries, normalization_queries, run_log_queries};
use crate::errors::AppError;
use crate::external::{parallel, Sources};
use crate::models::{Country, Metric, NormalizationParam, ObservationUpsert, RawMetrics, RunStatus};
use crate::services::indicators::{pct_change, rolling_std_log_returns};
use crate::services::scoring::compute_stress_score;

/// The one country with a tracked parallel exchange market.
pub const PARALLEL_MARKET_ISO2: &str = "AR";
/// The one country with a tracked stablecoin premium.
pub const STABLECOIN_ISO2: &str = "AR";

const FX_VOL_WINDOW: usize = 30;
/// Two-year baseline for inflation acceleration.
const ACCELERATION_BASELINE_DAYS: u64 = 730;
/// The ~90-day reserves-change baseline is the most recent level in
/// this calendar-day window.
const RESERVES_BASELINE_MIN_DAYS: u64 = 80;
const RESERVES_BASELINE_MAX_DAYS: u64 = 100;

/// Terminal result of one pipeline invocation; serialized verbatim as
/// the trigger endpoint's response body.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub skipped: bool,
    pub run_date: NaiveDate,
    pub countries_updated: usize,
    pub countries_total: usize,
    pub errors: Vec<String>,
    pub duration_ms: i64,
}

struct SharedDaily {
    today: NaiveDate,
    is_monthly: bool,
    crypto_ratio: Option<f64>,
    risk_free: Option<(NaiveDate, f64)>,
}

/// Single entry point, invoked by the external scheduler (and the
/// optional in-process one; the guard makes dual triggering safe).
pub async fn run_daily_pipeline(pool: &PgPool, sources: &Sources) -> Result<RunOutcome, AppError> {
    let started = std::time::Instant::now();
    // the single shared "today"; every per-country path keys off this
    let today = Utc::now().date_naive();

    if run_log_queries::find_success_for_date(pool, today).await?.is_some() {
        info!("pipeline already succeeded for {}, skipping", today);
        return Ok(RunOutcome {
            status: RunStatus::Success,
            skipped: true,
            run_date: today,
            countries_updated: 0,
            countries_total: 0,
            errors: Vec::new(),
            duration_ms: started.elapsed().as_millis() as i64,
        });
    }

    // Prelude: these two loads are the only fatal failures of a run.
    let countries = country_queries::fetch_all(pool).await?;
    let norm_rows = normalization_queries::fetch_all(pool).await?;
    let mut norms_by_country: HashMap<i64, Vec<NormalizationParam>> = HashMap::new();
    for param in norm_rows {
        if param.max_val <= param.min_val {
            warn!(
                "degenerate normalization row (country {}, {}): [{}, {}]",
                param.country_id, param.metric_name, param.min_val, param.max_val
            );
        }
        norms_by_country.entry(param.country_id).or_default().push(param);
    }

    let mut errors: Vec<String> = Vec::new();

    let (crypto_ratio, risk_free) = futures::future::join(
        sources.crypto.latest_ratio(),
        sources.risk_free.latest_yield(),
    )
    .await;
    let crypto_ratio = match crypto_ratio {
        Ok(ratio) => Some(ratio),
        Err(e) => {
            warn!("crypto ratio fetch failed: {}", e);
            errors.push(format!("crypto: {e}"));
            None
        }
    };
    let risk_free = match risk_free {
        Ok(point) => Some(point),
        Err(e) => {
            warn!("risk-free fetch failed: {}", e);
            errors.push(format!("risk_free: {e}"));
            None
        }
    };

    let shared = SharedDaily {
        today,
        is_monthly: today.day() == 1,
        crypto_ratio,
        risk_free,
    };
    if shared.is_monthly {
        info!("monthly boundary: refetching inflation/sovereign/reserves");
    }

    let mut updated = 0usize;
    for country in &countries {
        let norms = norms_by_country
            .get(&country.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        match process_country(pool, sources, country, norms, &shared, &mut errors).await {
            Ok(()) => updated += 1,
            Err(e) => {
                error!("skipping {}: {}", country.iso2, e);
                errors.push(format!("{}: {e}", country.iso2));
            }
        }
    }

    let status = run_status(updated, &errors);
    let duration_ms = started.elapsed().as_millis() as i64;
    let detail = json!({
        "countries_updated": updated,
        "countries_total": countries.len(),
        "monthly": shared.is_monthly,
        "errors": errors,
    });
    run_log_queries::insert(pool, today, status.as_str(), &detail, duration_ms).await?;

    info!(
        "pipeline finished: {} ({}/{} countries, {} errors, {}ms)",
        status.as_str(),
        updated,
        countries.len(),
        errors.len(),
        duration_ms
    );

    Ok(RunOutcome {
        status,
        skipped: false,
        run_date: today,
        countries_updated: updated,
        countries_total: countries.len(),
        errors,
        duration_ms,
    })
}

fn run_status(updated: usize, errors: &[String]) -> RunStatus {
    if errors.is_empty() {
        RunStatus::Success
    } else if updated > 0 {
        RunStatus::Partial
    } else {
        RunStatus::Error
    }
}

async fn process_country(
    pool: &PgPool,
    sources: &Sources,
    country: &Country,
    norms: &[NormalizationParam],
    shared: &SharedDaily,
    errors: &mut Vec<String>,
) -> Result<(), AppError> {
    let mut flags = Map::new();
    let mut forward_filled: Vec<&'static str> = Vec::new();
    let mut sovereign_fallback = false;

    // Daily FX. The provider's reported date keys the row; when the
    // fetch fails the row falls back to today's UTC date and fx columns
    // stay unwritten (previously stored values survive the upsert).
    let fx = sources.fx.latest_close(&country.currency).await;
    let (row_date, fx_close) = match fx {
        Ok(close) => (close.date, Some(close.close)),
        Err(e) => {
            warn!("fx fetch failed for {}: {}", country.iso2, e);
            errors.push(format!("{}: fx: {e}", country.iso2));
            (shared.today, None)
        }
    };

    let fx_vol = match fx_close {
        Some(close) => {
            let mut closes = observation_queries::recent_fx_closes(
                pool,
                country.id,
                row_date,
                FX_VOL_WINDOW as i64,
            )
            .await?;
            closes.push(close);
            rolling_std_log_returns(&closes, FX_VOL_WINDOW)
                .pop()
                .flatten()
        }
        None => None,
    };

    let parallel_gap = match fx_close {
        Some(official) if country.iso2 == PARALLEL_MARKET_ISO2 => {
            match sources.parallel.latest_rate().await {
                Ok(rate) => parallel::gap_pct(rate, official),
                Err(e) => {
                    warn!("parallel market fetch failed: {}", e);
                    errors.push(format!("{}: parallel: {e}", country.iso2));
                    None
                }
            }
        }
        _ => None,
    };

    // Forward-fill priming: last-known raw values, fetched concurrently.
    let (last_yoy, last_yield, last_reserves, last_premium) = tokio::try_join!(
        observation_queries::latest_value(pool, country.id, ValueColumn::InflationYoy, None),
        observation_queries::latest_value(pool, country.id, ValueColumn::SovereignYield, None),
        observation_queries::latest_value(pool, country.id, ValueColumn::ReservesLevel, None),
        observation_queries::latest_value(pool, country.id, ValueColumn::StablecoinPremium, None),
    )?;

    let (inflation_yoy, sovereign_yield, reserves_level) = if shared.is_monthly {
        let yoy = match sources.inflation.latest_yoy(&country.iso2).await {
            Ok(point) => point.value,
            Err(e) => {
                warn!("inflation fetch failed for {}: {}", country.iso2, e);
                errors.push(format!("{}: inflation: {e}", country.iso2));
                if last_yoy.is_some() {
                    forward_filled.push("inflation_yoy");
                }
                last_yoy.map(|(_, v)| v)
            }
        };
        let yield_ = match sources.sovereign.latest_yield(country).await {
            Ok(fetch) => {
                sovereign_fallback = fetch.fallback;
                Some(fetch.value)
            }
            Err(e) => {
                warn!("sovereign fetch failed for {}: {}", country.iso2, e);
                errors.push(format!("{}: sovereign: {e}", country.iso2));
                if last_yield.is_some() {
                    forward_filled.push("sovereign_yield");
                }
                last_yield.map(|(_, v)| v)
            }
        };
        let reserves = match sources.reserves.latest_level(country).await {
            Ok((_, level)) => Some(level),
            Err(e) => {
                warn!("reserves fetch failed for {}: {}", country.iso2, e);
                errors.push(format!("{}: reserves: {e}", country.iso2));
                if last_reserves.is_some() {
                    forward_filled.push("reserves_level");
                }
                last_reserves.map(|(_, v)| v)
            }
        };
        (yoy, yield_, reserves)
    } else {
        (
            last_yoy.map(|(_, v)| v),
            last_yield.map(|(_, v)| v),
            last_reserves.map(|(_, v)| v),
        )
    };

    let stablecoin_premium = if country.iso2 == STABLECOIN_ISO2 {
        match fx_close {
            Some(official) => match sources.stablecoin.latest_premium(official).await {
                Ok(premium) => Some(premium),
                Err(e) => {
                    warn!("stablecoin fetch failed: {}", e);
                    errors.push(format!("{}: stablecoin: {e}", country.iso2));
                    if last_premium.is_some() {
                        forward_filled.push("stablecoin_premium");
                    }
                    last_premium.map(|(_, v)| v)
                }
            },
            None => {
                if last_premium.is_some() {
                    forward_filled.push("stablecoin_premium");
                }
                last_premium.map(|(_, v)| v)
            }
        }
    } else {
        None
    };

    // Risk-free for the day, falling back to the last stored value.
    let us_10y = match shared.risk_free {
        Some((_, value)) => Some(value),
        None => {
            let last =
                observation_queries::latest_value(pool, country.id, ValueColumn::Us10y, None)
                    .await?;
            if last.is_some() {
                forward_filled.push("us_10y");
            }
            last.map(|(_, v)| v)
        }
    };

    let risk_spread = match (sovereign_yield, us_10y) {
        (Some(yield_), Some(rf)) => Some(yield_ - rf),
        _ => None,
    };

    // Acceleration against the YoY stored two years back; null until
    // enough history exists.
    let inflation_accel = match inflation_yoy {
        Some(yoy) => {
            let cutoff = shared.today - Days::new(ACCELERATION_BASELINE_DAYS);
            observation_queries::latest_value(
                pool,
                country.id,
                ValueColumn::InflationYoy,
                Some(cutoff),
            )
            .await?
            .map(|(_, baseline)| yoy - baseline)
        }
        None => None,
    };

    let reserves_change = match reserves_level {
        Some(level) => {
            let from = shared.today - Days::new(RESERVES_BASELINE_MAX_DAYS);
            let to = shared.today - Days::new(RESERVES_BASELINE_MIN_DAYS);
            let baseline =
                observation_queries::reserves_level_in_window(pool, country.id, from, to).await?;
            pct_change(level, baseline)
        }
        None => None,
    };

    let raw = RawMetrics {
        fx_vol,
        inflation: inflation_accel,
        risk_spread,
        crypto_ratio: shared.crypto_ratio,
        reserves_change,
        stablecoin_premium,
    };

    let outcome = compute_stress_score(&raw, norms);
    let stress_score = outcome.as_ref().map(|o| o.score);
    match &outcome {
        Some(outcome) => flags.extend(outcome.flags()),
        None => {
            // unscorable row; raw columns still land below
            flags.insert("partial".into(), json!(true));
            flags.insert(
                "missing".into(),
                json!(Metric::ALL.map(|m| m.name()).to_vec()),
            );
        }
    }
    if !forward_filled.is_empty() {
        flags.insert("forward_filled".into(), json!(forward_filled));
    }
    if sovereign_fallback {
        flags.insert("sovereign_fallback".into(), json!(true));
    }

    let row = ObservationUpsert {
        country_id: country.id,
        date: row_date,
        fx_close,
        inflation_yoy,
        sovereign_yield,
        us_10y,
        reserves_level,
        parallel_gap,
        fx_vol,
        inflation: inflation_accel,
        risk_spread,
        crypto_ratio: shared.crypto_ratio,
        reserves_change,
        stablecoin_premium,
        stress_score,
        data_flags: Some(Value::Object(flags)),
    };
    observation_queries::upsert(pool, &row).await?;

    info!(
        "{} scored {:?} for {}",
        country.iso2, stress_score, row_date
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_success_without_errors() {
        assert_eq!(run_status(10, &[]), RunStatus::Success);
        assert_eq!(run_status(0, &[]), RunStatus::Success);
    }

    #[test]
    fn status_partial_when_some_updated_with_errors() {
        let errs = vec!["AR: fx: network error".to_string()];
        assert_eq!(run_status(9, &errs), RunStatus::Partial);
    }

    #[test]
    fn status_error_when_nothing_updated() {
        let errs = vec!["db down".to_string()];
        assert_eq!(run_status(0, &errs), RunStatus::Error);
    }
}
