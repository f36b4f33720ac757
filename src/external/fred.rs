use chrono::NaiveDate;
use serde::Deserialize;

use crate::external::SourceError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// Thin client for the FRED observations endpoint, shared by the
/// sovereign-yield primary adapter and the risk-free adapter.
#[derive(Clone)]
pub struct FredClient {
    client: reqwest::Client,
    bulk_client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Clone)]
pub struct FredObservation {
    pub date: NaiveDate,
    /// FRED encodes missing observations as "."; those become `None`.
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FredResponse {
    observations: Option<Vec<FredRawObservation>>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FredRawObservation {
    date: String,
    value: String,
}

impl FredClient {
    pub fn new(client: reqwest::Client, bulk_client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            bulk_client,
            api_key,
        }
    }

    /// The newest `limit` observations, most recent first.
    pub async fn recent_observations(
        &self,
        series_id: &str,
        limit: u32,
    ) -> Result<Vec<FredObservation>, SourceError> {
        self.fetch(&self.client, series_id, None, "desc", Some(limit))
            .await
    }

    /// Full series from `start`, ascending. Used by the backfill
    /// reducers, so it runs on the bulk-timeout client.
    pub async fn series_from(
        &self,
        series_id: &str,
        start: NaiveDate,
    ) -> Result<Vec<FredObservation>, SourceError> {
        self.fetch(&self.bulk_client, series_id, Some(start), "asc", None)
            .await
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        series_id: &str,
        start: Option<NaiveDate>,
        sort_order: &str,
        limit: Option<u32>,
    ) -> Result<Vec<FredObservation>, SourceError> {
        let mut query: Vec<(&str, String)> = vec![
            ("series_id", series_id.to_string()),
            ("api_key", self.api_key.clone()),
            ("file_type", "json".to_string()),
            ("sort_order", sort_order.to_string()),
        ];
        if let Some(start) = start {
            query.push(("observation_start", start.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let resp = client
            .get(BASE_URL)
            .query(&query)
            .send()
            .await
            .map_err(SourceError::network)?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }

        let body = resp
            .json::<FredResponse>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        if let Some(msg) = body.error_message {
            return Err(SourceError::BadResponse(msg));
        }

        let observations = body.observations.ok_or(SourceError::NotFound)?;
        observations
            .into_iter()
            .map(|obs| {
                let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
                    .map_err(|e| SourceError::Parse(e.to_string()))?;
                let value = match obs.value.as_str() {
                    "." => None,
                    s => Some(
                        s.parse::<f64>()
                            .map_err(|e| SourceError::Parse(e.to_string()))?,
                    ),
                };
                Ok(FredObservation { date, value })
            })
            .collect()
    }
}
