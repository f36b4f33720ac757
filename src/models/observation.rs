use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{Metric, RawMetrics};

// One row per (country, calendar date). Raw source values plus the
// derived metrics and the final score. Nullable columns stay NULL until
// a source or reducer provides them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyObservation {
    pub id: i64,
    pub country_id: i64,
    pub date: NaiveDate,
    pub fx_close: Option<f64>,
    pub inflation_yoy: Option<f64>,
    pub sovereign_yield: Option<f64>,
    pub us_10y: Option<f64>,
    pub reserves_level: Option<f64>,
    pub parallel_gap: Option<f64>,
    pub fx_vol: Option<f64>,
    pub inflation: Option<f64>,
    pub risk_spread: Option<f64>,
    pub crypto_ratio: Option<f64>,
    pub reserves_change: Option<f64>,
    pub stablecoin_premium: Option<f64>,
    pub stress_score: Option<f64>,
    pub data_flags: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyObservation {
    /// The scored-metric slice of this row, as the engine consumes it.
    pub fn raw_metrics(&self) -> RawMetrics {
        RawMetrics {
            fx_vol: self.fx_vol,
            inflation: self.inflation,
            risk_spread: self.risk_spread,
            crypto_ratio: self.crypto_ratio,
            reserves_change: self.reserves_change,
            stablecoin_premium: self.stablecoin_premium,
        }
    }
}

/// Column set for a partial upsert of one (country, date) row.
/// `None` fields are left untouched in an existing row; `data_flags`
/// is always rewritten when supplied.
#[derive(Debug, Clone, Default)]
pub struct ObservationUpsert {
    pub country_id: i64,
    pub date: NaiveDate,
    pub fx_close: Option<f64>,
    pub inflation_yoy: Option<f64>,
    pub sovereign_yield: Option<f64>,
    pub us_10y: Option<f64>,
    pub reserves_level: Option<f64>,
    pub parallel_gap: Option<f64>,
    pub fx_vol: Option<f64>,
    pub inflation: Option<f64>,
    pub risk_spread: Option<f64>,
    pub crypto_ratio: Option<f64>,
    pub reserves_change: Option<f64>,
    pub stablecoin_premium: Option<f64>,
    pub stress_score: Option<f64>,
    pub data_flags: Option<serde_json::Value>,
}

impl ObservationUpsert {
    pub fn new(country_id: i64, date: NaiveDate) -> Self {
        Self {
            country_id,
            date,
            ..Default::default()
        }
    }

    pub fn set_metric(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::FxVol => self.fx_vol = value,
            Metric::Inflation => self.inflation = value,
            Metric::RiskSpread => self.risk_spread = value,
            Metric::CryptoRatio => self.crypto_ratio = value,
            Metric::ReservesChange => self.reserves_change = value,
            Metric::StablecoinPremium => self.stablecoin_premium = value,
        }
    }
}
