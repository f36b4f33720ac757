use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::external::SourceError;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage FX_DAILY adapter. Quotes are USD/<local>, i.e. units of
/// local currency per dollar.
pub struct FxProvider {
    client: reqwest::Client,
    bulk_client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Clone, Copy)]
pub struct FxClose {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Deserialize)]
struct FxDailyResponse {
    #[serde(rename = "Time Series FX (Daily)")]
    time_series: Option<BTreeMap<String, FxDailyBar>>,

    // Throttle response: { "Note": "Thank you for using Alpha Vantage! ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FxDailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

impl FxProvider {
    pub fn new(client: reqwest::Client, bulk_client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            bulk_client,
            api_key,
        }
    }

    /// The most recent trading day's close for USD/<currency>.
    pub async fn latest_close(&self, currency: &str) -> Result<FxClose, SourceError> {
        let series = self.fetch_series(&self.client, currency, "compact").await?;
        series
            .into_iter()
            .next_back()
            .ok_or_else(|| SourceError::BadResponse("empty FX series".into()))
    }

    /// Full daily history, ascending. Backfill only.
    pub async fn daily_history(&self, currency: &str) -> Result<Vec<FxClose>, SourceError> {
        self.fetch_series(&self.bulk_client, currency, "full").await
    }

    async fn fetch_series(
        &self,
        client: &reqwest::Client,
        currency: &str,
        outputsize: &str,
    ) -> Result<Vec<FxClose>, SourceError> {
        let resp = client
            .get(BASE_URL)
            .query(&[
                ("function", "FX_DAILY"),
                ("from_symbol", "USD"),
                ("to_symbol", currency),
                ("outputsize", outputsize),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(SourceError::network)?;

        let body = resp
            .json::<FxDailyResponse>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        if body.note.is_some() {
            return Err(SourceError::RateLimited);
        }
        if let Some(msg) = body.error_message {
            return Err(SourceError::BadResponse(msg));
        }

        let series = body.time_series.ok_or(SourceError::NotFound)?;

        // keyed by "YYYY-MM-DD"; BTreeMap iteration is already ascending
        series
            .into_iter()
            .map(|(date_str, bar)| {
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                    .map_err(|e| SourceError::Parse(e.to_string()))?;
                let close = bar
                    .close
                    .parse::<f64>()
                    .map_err(|e| SourceError::Parse(e.to_string()))?;
                Ok(FxClose { date, close })
            })
            .collect()
    }
}
