use chrono::NaiveDate;

use crate::external::imf::ImfSdmxClient;
use crate::external::SourceError;
use crate::models::Country;

/// IFS indicator: total reserves excluding gold, USD.
const IMF_RESERVES_INDICATOR: &str = "RAXG_USD";

/// IMF monthly total-reserves levels (USD).
pub struct ReservesProvider {
    imf: ImfSdmxClient,
}

impl ReservesProvider {
    pub fn new(imf: ImfSdmxClient) -> Self {
        Self { imf }
    }

    /// Latest non-null monthly level.
    pub async fn latest_level(&self, country: &Country) -> Result<(NaiveDate, f64), SourceError> {
        let start = chrono::Utc::now().date_naive() - chrono::Days::new(366);
        let series = self
            .imf
            .monthly_series(
                &country.imf_code,
                IMF_RESERVES_INDICATOR,
                &start.format("%Y-%m").to_string(),
            )
            .await?;
        series.into_iter().next_back().ok_or(SourceError::NotFound)
    }

    /// Monthly series from `start`, ascending. Backfill only.
    pub async fn monthly_series(
        &self,
        country: &Country,
        start: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, SourceError> {
        self.imf
            .monthly_series(
                &country.imf_code,
                IMF_RESERVES_INDICATOR,
                &start.format("%Y-%m").to_string(),
            )
            .await
    }
}
