use std::collections::BTreeMap;

use serde_json::Value;

use crate::external::SourceError;
use crate::services::indicators::median;

const QUOTES_URL: &str = "https://criptoya.com/api/usdt/ars/1";

/// Exchanges required before a premium is trusted.
const MIN_EXCHANGES: usize = 2;

/// CriptoYa USDT/ARS quotes across Argentine exchanges. The premium of
/// the median total-ask over the official rate tracks informal dollar
/// demand when the parallel print lags.
pub struct StablecoinProvider {
    client: reqwest::Client,
}

impl StablecoinProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Premium (%) of the cross-exchange median total-ask over the
    /// official USD rate.
    pub async fn latest_premium(&self, official_rate: f64) -> Result<f64, SourceError> {
        if official_rate <= 0.0 {
            return Err(SourceError::BadResponse("non-positive official rate".into()));
        }

        let body = self
            .client
            .get(QUOTES_URL)
            .send()
            .await
            .map_err(SourceError::network)?
            .json::<BTreeMap<String, Value>>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let asks: Vec<f64> = body
            .values()
            .filter_map(|quote| quote.get("totalAsk")?.as_f64())
            .filter(|ask| *ask > 0.0)
            .collect();

        if asks.len() < MIN_EXCHANGES {
            return Err(SourceError::BadResponse(format!(
                "only {} exchange quotes, need {}",
                asks.len(),
                MIN_EXCHANGES
            )));
        }

        let median_ask = median(&asks).ok_or(SourceError::NotFound)?;
        Ok((median_ask - official_rate) / official_rate * 100.0)
    }
}
