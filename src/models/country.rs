use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// One tracked country. Seeded by migration, never mutated by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub iso2: String,
    pub iso3: String,
    pub imf_code: String,
    pub currency: String,
    /// FRED series id for the sovereign yield, when the primary source
    /// carries this country. None means the SDMX fallback is used.
    pub primary_source_series_id: Option<String>,
}
