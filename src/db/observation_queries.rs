use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{DailyObservation, ObservationUpsert};

/// Reference batch size for reducer upserts.
pub const UPSERT_BATCH_SIZE: usize = 500;

const OBSERVATION_COLUMNS: &str = r#"
    id, country_id, date, fx_close, inflation_yoy, sovereign_yield, us_10y,
    reserves_level, parallel_gap, fx_vol, inflation, risk_spread, crypto_ratio,
    reserves_change, stablecoin_premium, stress_score, data_flags,
    created_at, updated_at
"#;

/// Raw columns addressable by the last-known-value point queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueColumn {
    InflationYoy,
    SovereignYield,
    Us10y,
    ReservesLevel,
    CryptoRatio,
    StablecoinPremium,
    FxVol,
    Inflation,
    RiskSpread,
    ReservesChange,
}

impl ValueColumn {
    pub fn as_sql(self) -> &'static str {
        match self {
            ValueColumn::InflationYoy => "inflation_yoy",
            ValueColumn::SovereignYield => "sovereign_yield",
            ValueColumn::Us10y => "us_10y",
            ValueColumn::ReservesLevel => "reserves_level",
            ValueColumn::CryptoRatio => "crypto_ratio",
            ValueColumn::StablecoinPremium => "stablecoin_premium",
            ValueColumn::FxVol => "fx_vol",
            ValueColumn::Inflation => "inflation",
            ValueColumn::RiskSpread => "risk_spread",
            ValueColumn::ReservesChange => "reserves_change",
        }
    }
}

/// Idempotent partial upsert of one (country, date) row.
///
/// Supplied (non-`None`) columns overwrite; absent columns keep whatever
/// an earlier writer stored. This is what lets the daily run rewrite the
/// score without losing monthly raw values.
pub async fn upsert(pool: &PgPool, row: &ObservationUpsert) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO daily_observations (
            country_id, date, fx_close, inflation_yoy, sovereign_yield, us_10y,
            reserves_level, parallel_gap, fx_vol, inflation, risk_spread,
            crypto_ratio, reserves_change, stablecoin_premium, stress_score, data_flags
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT (country_id, date) DO UPDATE SET
            fx_close = COALESCE(EXCLUDED.fx_close, daily_observations.fx_close),
            inflation_yoy = COALESCE(EXCLUDED.inflation_yoy, daily_observations.inflation_yoy),
            sovereign_yield = COALESCE(EXCLUDED.sovereign_yield, daily_observations.sovereign_yield),
            us_10y = COALESCE(EXCLUDED.us_10y, daily_observations.us_10y),
            reserves_level = COALESCE(EXCLUDED.reserves_level, daily_observations.reserves_level),
            parallel_gap = COALESCE(EXCLUDED.parallel_gap, daily_observations.parallel_gap),
            fx_vol = COALESCE(EXCLUDED.fx_vol, daily_observations.fx_vol),
            inflation = COALESCE(EXCLUDED.inflation, daily_observations.inflation),
            risk_spread = COALESCE(EXCLUDED.risk_spread, daily_observations.risk_spread),
            crypto_ratio = COALESCE(EXCLUDED.crypto_ratio, daily_observations.crypto_ratio),
            reserves_change = COALESCE(EXCLUDED.reserves_change, daily_observations.reserves_change),
            stablecoin_premium = COALESCE(EXCLUDED.stablecoin_premium, daily_observations.stablecoin_premium),
            stress_score = COALESCE(EXCLUDED.stress_score, daily_observations.stress_score),
            data_flags = COALESCE(EXCLUDED.data_flags, daily_observations.data_flags),
            updated_at = NOW()
        "#,
    )
    .bind(row.country_id)
    .bind(row.date)
    .bind(row.fx_close)
    .bind(row.inflation_yoy)
    .bind(row.sovereign_yield)
    .bind(row.us_10y)
    .bind(row.reserves_level)
    .bind(row.parallel_gap)
    .bind(row.fx_vol)
    .bind(row.inflation)
    .bind(row.risk_spread)
    .bind(row.crypto_ratio)
    .bind(row.reserves_change)
    .bind(row.stablecoin_premium)
    .bind(row.stress_score)
    .bind(row.data_flags.clone())
    .execute(pool)
    .await?;
    Ok(())
}

/// Batch variant for the backfill reducers, chunked at
/// [`UPSERT_BATCH_SIZE`] rows per statement.
pub async fn upsert_batch(pool: &PgPool, rows: &[ObservationUpsert]) -> Result<(), sqlx::Error> {
    for chunk in rows.chunks(UPSERT_BATCH_SIZE) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO daily_observations (
                country_id, date, fx_close, inflation_yoy, sovereign_yield, us_10y,
                reserves_level, parallel_gap, fx_vol, inflation, risk_spread,
                crypto_ratio, reserves_change, stablecoin_premium, stress_score, data_flags) ",
        );
        qb.push_values(chunk, |mut b, row| {
            b.push_bind(row.country_id)
                .push_bind(row.date)
                .push_bind(row.fx_close)
                .push_bind(row.inflation_yoy)
                .push_bind(row.sovereign_yield)
                .push_bind(row.us_10y)
                .push_bind(row.reserves_level)
                .push_bind(row.parallel_gap)
                .push_bind(row.fx_vol)
                .push_bind(row.inflation)
                .push_bind(row.risk_spread)
                .push_bind(row.crypto_ratio)
                .push_bind(row.reserves_change)
                .push_bind(row.stablecoin_premium)
                .push_bind(row.stress_score)
                .push_bind(row.data_flags.clone());
        });
        qb.push(
            r#" ON CONFLICT (country_id, date) DO UPDATE SET
                fx_close = COALESCE(EXCLUDED.fx_close, daily_observations.fx_close),
                inflation_yoy = COALESCE(EXCLUDED.inflation_yoy, daily_observations.inflation_yoy),
                sovereign_yield = COALESCE(EXCLUDED.sovereign_yield, daily_observations.sovereign_yield),
                us_10y = COALESCE(EXCLUDED.us_10y, daily_observations.us_10y),
                reserves_level = COALESCE(EXCLUDED.reserves_level, daily_observations.reserves_level),
                parallel_gap = COALESCE(EXCLUDED.parallel_gap, daily_observations.parallel_gap),
                fx_vol = COALESCE(EXCLUDED.fx_vol, daily_observations.fx_vol),
                inflation = COALESCE(EXCLUDED.inflation, daily_observations.inflation),
                risk_spread = COALESCE(EXCLUDED.risk_spread, daily_observations.risk_spread),
                crypto_ratio = COALESCE(EXCLUDED.crypto_ratio, daily_observations.crypto_ratio),
                reserves_change = COALESCE(EXCLUDED.reserves_change, daily_observations.reserves_change),
                stablecoin_premium = COALESCE(EXCLUDED.stablecoin_premium, daily_observations.stablecoin_premium),
                stress_score = COALESCE(EXCLUDED.stress_score, daily_observations.stress_score),
                data_flags = COALESCE(EXCLUDED.data_flags, daily_observations.data_flags),
                updated_at = NOW()"#,
        );
        qb.build().execute(pool).await?;
    }
    Ok(())
}

/// Most recent non-null value of `column` for a country, optionally
/// bounded by `at_or_before`. Primes forward-fill and delta baselines.
pub async fn latest_value(
    pool: &PgPool,
    country_id: i64,
    column: ValueColumn,
    at_or_before: Option<NaiveDate>,
) -> Result<Option<(NaiveDate, f64)>, sqlx::Error> {
    let col = column.as_sql();
    let sql = match at_or_before {
        Some(_) => format!(
            "SELECT date, {col} FROM daily_observations
             WHERE country_id = $1 AND {col} IS NOT NULL AND date <= $2
             ORDER BY date DESC LIMIT 1"
        ),
        None => format!(
            "SELECT date, {col} FROM daily_observations
             WHERE country_id = $1 AND {col} IS NOT NULL
             ORDER BY date DESC LIMIT 1"
        ),
    };
    let mut query = sqlx::query_as::<_, (NaiveDate, f64)>(&sql).bind(country_id);
    if let Some(cutoff) = at_or_before {
        query = query.bind(cutoff);
    }
    query.fetch_optional(pool).await
}

/// Most recent reserves level within [from, to], for the ~90-day
/// reserves-change baseline.
pub async fn reserves_level_in_window(
    pool: &PgPool,
    country_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        r#"
        SELECT reserves_level FROM daily_observations
        WHERE country_id = $1
          AND reserves_level IS NOT NULL
          AND date BETWEEN $2 AND $3
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .bind(country_id)
    .bind(from)
    .bind(to)
    .fetch_optional(pool)
    .await
}

/// Last `limit` non-null fx closes strictly before `date`, ascending.
pub async fn recent_fx_closes(
    pool: &PgPool,
    country_id: i64,
    before: NaiveDate,
    limit: i64,
) -> Result<Vec<f64>, sqlx::Error> {
    let closes = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT fx_close FROM daily_observations
        WHERE country_id = $1 AND fx_close IS NOT NULL AND date < $2
        ORDER BY date DESC
        LIMIT $3
        "#,
    )
    .bind(country_id)
    .bind(before)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(closes.into_iter().rev().collect())
}

/// Latest row carrying a stress score.
pub async fn latest_scored(
    pool: &PgPool,
    country_id: i64,
) -> Result<Option<DailyObservation>, sqlx::Error> {
    sqlx::query_as::<_, DailyObservation>(&format!(
        "SELECT {OBSERVATION_COLUMNS} FROM daily_observations
         WHERE country_id = $1 AND stress_score IS NOT NULL
         ORDER BY date DESC LIMIT 1"
    ))
    .bind(country_id)
    .fetch_optional(pool)
    .await
}

/// Newest scored row with date at or before the cutoff (delta baseline).
pub async fn latest_scored_at_or_before(
    pool: &PgPool,
    country_id: i64,
    cutoff: NaiveDate,
) -> Result<Option<DailyObservation>, sqlx::Error> {
    sqlx::query_as::<_, DailyObservation>(&format!(
        "SELECT {OBSERVATION_COLUMNS} FROM daily_observations
         WHERE country_id = $1 AND stress_score IS NOT NULL AND date <= $2
         ORDER BY date DESC LIMIT 1"
    ))
    .bind(country_id)
    .bind(cutoff)
    .fetch_optional(pool)
    .await
}

/// Up to the last `limit` scored rows, returned in chronological order.
pub async fn scored_history(
    pool: &PgPool,
    country_id: i64,
    limit: i64,
) -> Result<Vec<DailyObservation>, sqlx::Error> {
    let mut rows = sqlx::query_as::<_, DailyObservation>(&format!(
        "SELECT {OBSERVATION_COLUMNS} FROM daily_observations
         WHERE country_id = $1 AND stress_score IS NOT NULL
         ORDER BY date DESC LIMIT $2"
    ))
    .bind(country_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.reverse();
    Ok(rows)
}

/// Every non-null (date, value) of `column` for a country from `from`
/// onward, ascending. Feeds the normalization builder.
pub async fn metric_history(
    pool: &PgPool,
    country_id: i64,
    column: ValueColumn,
    from: NaiveDate,
) -> Result<Vec<(NaiveDate, f64)>, sqlx::Error> {
    let col = column.as_sql();
    sqlx::query_as::<_, (NaiveDate, f64)>(&format!(
        "SELECT date, {col} FROM daily_observations
         WHERE country_id = $1 AND {col} IS NOT NULL AND date >= $2
         ORDER BY date ASC"
    ))
    .bind(country_id)
    .bind(from)
    .fetch_all(pool)
    .await
}
