use serde::Deserialize;
use serde_json::Value;

use crate::external::SourceError;

const BASE_URL: &str = "https://api.worldbank.org/v2/country";
const INDICATOR: &str = "FP.CPI.TOTL.ZG";

/// World Bank annual CPI inflation (YoY, %). The provider is annual-only;
/// daily rows are produced by forward-filling downstream.
pub struct InflationProvider {
    client: reqwest::Client,
}

#[derive(Debug, Clone, Copy)]
pub struct AnnualPoint {
    pub year: i32,
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WbEntry {
    date: String,
    value: Option<f64>,
}

impl InflationProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Latest year with a non-null YoY value.
    pub async fn latest_yoy(&self, iso2: &str) -> Result<AnnualPoint, SourceError> {
        let series = self.annual_series(iso2).await?;
        series
            .into_iter()
            .rev()
            .find(|p| p.value.is_some())
            .ok_or(SourceError::NotFound)
    }

    /// Full annual series, ascending by year, null years preserved.
    pub async fn annual_series(&self, iso2: &str) -> Result<Vec<AnnualPoint>, SourceError> {
        let url = format!("{BASE_URL}/{iso2}/indicator/{INDICATOR}");
        let body = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("per_page", "100")])
            .send()
            .await
            .map_err(SourceError::network)?
            .json::<Value>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        // Payload is [metadata, entries]; an error payload is a
        // one-element array with a message object.
        let entries = body
            .get(1)
            .cloned()
            .ok_or_else(|| SourceError::BadResponse("missing data block".into()))?;
        let entries: Vec<WbEntry> = serde_json::from_value(entries)
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let mut points: Vec<AnnualPoint> = entries
            .into_iter()
            .filter_map(|e| {
                let year = e.date.parse::<i32>().ok()?;
                Some(AnnualPoint {
                    year,
                    value: e.value,
                })
            })
            .collect();
        points.sort_by_key(|p| p.year);

        if points.is_empty() {
            return Err(SourceError::NotFound);
        }
        Ok(points)
    }
}
