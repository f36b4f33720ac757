use serde::Deserialize;

use crate::external::SourceError;

const LATEST_URL: &str = "https://api.bluelytics.com.ar/v2/latest";

/// Bluelytics blue-dollar quote (Argentina only; no other tracked
/// country has a liquid parallel market with a free feed).
pub struct ParallelFxProvider {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct BluelyticsResponse {
    blue: BluelyticsQuote,
}

#[derive(Debug, Deserialize)]
struct BluelyticsQuote {
    value_sell: f64,
}

impl ParallelFxProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Current blue-dollar sell rate, ARS per USD.
    pub async fn latest_rate(&self) -> Result<f64, SourceError> {
        let body = self
            .client
            .get(LATEST_URL)
            .send()
            .await
            .map_err(SourceError::network)?
            .json::<BluelyticsResponse>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        if body.blue.value_sell <= 0.0 {
            return Err(SourceError::BadResponse("non-positive blue rate".into()));
        }
        Ok(body.blue.value_sell)
    }
}

/// Parallel-market gap in percent over the official rate.
pub fn gap_pct(parallel: f64, official: f64) -> Option<f64> {
    if official <= 0.0 {
        return None;
    }
    Some((parallel - official) / official * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_over_official() {
        assert_eq!(gap_pct(1300.0, 1000.0), Some(30.0));
        assert_eq!(gap_pct(1300.0, 0.0), None);
    }
}
