use chrono::NaiveDate;

use crate::external::fred::{FredClient, FredObservation};
use crate::external::SourceError;

/// US 10-year constant-maturity yield, the shared risk-free reference.
const SERIES_ID: &str = "DGS10";

pub struct RiskFreeProvider {
    fred: FredClient,
}

impl RiskFreeProvider {
    pub fn new(fred: FredClient) -> Self {
        Self { fred }
    }

    /// Most recent non-missing daily observation. The series has "."
    /// placeholders on weekends and holidays, so a handful of recent
    /// rows are scanned.
    pub async fn latest_yield(&self) -> Result<(NaiveDate, f64), SourceError> {
        let observations = self.fred.recent_observations(SERIES_ID, 10).await?;
        observations
            .into_iter()
            .find_map(|obs| obs.value.map(|v| (obs.date, v)))
            .ok_or(SourceError::NotFound)
    }

    /// Full daily series from `start`, ascending, missing days preserved
    /// as `None`. Backfill only.
    pub async fn daily_series(
        &self,
        start: NaiveDate,
    ) -> Result<Vec<FredObservation>, SourceError> {
        self.fred.series_from(SERIES_ID, start).await
    }
}
