use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// p5/p95 clamp bounds for one (country, metric), over the recorded
/// historical window. Written by the normalization builder, read by the
/// scoring engine on every call.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NormalizationParam {
    pub id: i64,
    pub country_id: i64,
    pub metric_name: String,
    pub min_val: f64,
    pub max_val: f64,
    pub method: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub updated_at: DateTime<Utc>,
}
