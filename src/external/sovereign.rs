use async_trait::async_trait;
use chrono::NaiveDate;

use crate::external::fred::FredClient;
use crate::external::imf::ImfSdmxClient;
use crate::external::SourceError;
use crate::models::Country;

/// IFS indicator: government bond yield, percent per annum.
const IMF_YIELD_INDICATOR: &str = "FIGB_PA";

/// A long-tenor sovereign yield source. FRED carries series for the
/// larger economies; everything else goes through the SDMX fallback,
/// which is often simply unavailable; callers treat that as a null
/// metric, not a failure.
#[async_trait]
pub trait YieldSource: Send + Sync {
    fn covers(&self, country: &Country) -> bool;

    /// Most recent yield observation.
    async fn latest_yield(&self, country: &Country) -> Result<(NaiveDate, f64), SourceError>;

    /// Monthly series from `start`, ascending.
    async fn monthly_series(
        &self,
        country: &Country,
        start: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, SourceError>;
}

pub struct FredYieldSource {
    fred: FredClient,
}

impl FredYieldSource {
    pub fn new(fred: FredClient) -> Self {
        Self { fred }
    }

    fn series_id<'c>(&self, country: &'c Country) -> Result<&'c str, SourceError> {
        country
            .primary_source_series_id
            .as_deref()
            .ok_or(SourceError::NotFound)
    }
}

#[async_trait]
impl YieldSource for FredYieldSource {
    fn covers(&self, country: &Country) -> bool {
        country.primary_source_series_id.is_some()
    }

    async fn latest_yield(&self, country: &Country) -> Result<(NaiveDate, f64), SourceError> {
        let series_id = self.series_id(country)?;
        let observations = self.fred.recent_observations(series_id, 6).await?;
        observations
            .into_iter()
            .find_map(|obs| obs.value.map(|v| (obs.date, v)))
            .ok_or(SourceError::NotFound)
    }

    async fn monthly_series(
        &self,
        country: &Country,
        start: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, SourceError> {
        let series_id = self.series_id(country)?;
        let observations = self.fred.series_from(series_id, start).await?;
        let points: Vec<(NaiveDate, f64)> = observations
            .into_iter()
            .filter_map(|obs| obs.value.map(|v| (obs.date, v)))
            .collect();
        if points.is_empty() {
            return Err(SourceError::NotFound);
        }
        Ok(points)
    }
}

pub struct ImfYieldSource {
    imf: ImfSdmxClient,
}

impl ImfYieldSource {
    pub fn new(imf: ImfSdmxClient) -> Self {
        Self { imf }
    }
}

#[async_trait]
impl YieldSource for ImfYieldSource {
    fn covers(&self, _country: &Country) -> bool {
        true
    }

    async fn latest_yield(&self, country: &Country) -> Result<(NaiveDate, f64), SourceError> {
        let start = chrono::Utc::now().date_naive() - chrono::Days::new(366);
        let series = self
            .imf
            .monthly_series(
                &country.imf_code,
                IMF_YIELD_INDICATOR,
                &start.format("%Y-%m").to_string(),
            )
            .await?;
        series.into_iter().next_back().ok_or(SourceError::NotFound)
    }

    async fn monthly_series(
        &self,
        country: &Country,
        start: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, SourceError> {
        self.imf
            .monthly_series(
                &country.imf_code,
                IMF_YIELD_INDICATOR,
                &start.format("%Y-%m").to_string(),
            )
            .await
    }
}

/// Yield fetched through the composite, with the source recorded for the
/// row's audit flags.
#[derive(Debug, Clone, Copy)]
pub struct YieldFetch {
    pub date: NaiveDate,
    pub value: f64,
    pub fallback: bool,
}

/// Primary-then-fallback composition over the two sources.
pub struct SovereignYields {
    primary: FredYieldSource,
    fallback: ImfYieldSource,
}

impl SovereignYields {
    pub fn new(fred: FredClient, imf: ImfSdmxClient) -> Self {
        Self {
            primary: FredYieldSource::new(fred),
            fallback: ImfYieldSource::new(imf),
        }
    }

    pub async fn latest_yield(&self, country: &Country) -> Result<YieldFetch, SourceError> {
        if self.primary.covers(country) {
            match self.primary.latest_yield(country).await {
                Ok((date, value)) => {
                    return Ok(YieldFetch {
                        date,
                        value,
                        fallback: false,
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        "primary yield source failed for {}: {}, trying fallback",
                        country.iso2,
                        e
                    );
                }
            }
        }
        let (date, value) = self.fallback.latest_yield(country).await?;
        Ok(YieldFetch {
            date,
            value,
            fallback: true,
        })
    }

    pub async fn monthly_series(
        &self,
        country: &Country,
        start: NaiveDate,
    ) -> Result<(Vec<(NaiveDate, f64)>, bool), SourceError> {
        if self.primary.covers(country) {
            match self.primary.monthly_series(country, start).await {
                Ok(series) => return Ok((series, false)),
                Err(e) => {
                    tracing::warn!(
                        "primary yield series failed for {}: {}, trying fallback",
                        country.iso2,
                        e
                    );
                }
            }
        }
        let series = self.fallback.monthly_series(country, start).await?;
        Ok((series, true))
    }
}
