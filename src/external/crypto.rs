use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::external::SourceError;

const MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";
const CHART_URL: &str = "https://api.coingecko.com/api/v3/coins";

/// Provider limit on the free market_chart endpoint.
pub const HISTORY_DAYS: u32 = 365;

/// CoinGecko market caps for the stablecoin-over-BTC ratio. The ratio is
/// global: one value per date, replicated to every country's row.
pub struct CryptoProvider {
    client: reqwest::Client,
    bulk_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MarketEntry {
    id: String,
    market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    market_caps: Vec<(f64, Option<f64>)>,
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

impl CryptoProvider {
    pub fn new(client: reqwest::Client, bulk_client: reqwest::Client) -> Self {
        Self {
            client,
            bulk_client,
        }
    }

    /// Current (USDT + USDC) / BTC market-cap ratio, 4 decimals.
    /// USDT and BTC are required; USDC is treated as zero when absent.
    pub async fn latest_ratio(&self) -> Result<f64, SourceError> {
        let entries = self
            .client
            .get(MARKETS_URL)
            .query(&[
                ("vs_currency", "usd"),
                ("ids", "bitcoin,tether,usd-coin"),
            ])
            .send()
            .await
            .map_err(SourceError::network)?
            .json::<Vec<MarketEntry>>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let cap = |coin: &str| {
            entries
                .iter()
                .find(|e| e.id == coin)
                .and_then(|e| e.market_cap)
        };

        let btc = cap("bitcoin")
            .filter(|v| *v > 0.0)
            .ok_or_else(|| SourceError::BadResponse("missing BTC market cap".into()))?;
        let usdt = cap("tether")
            .ok_or_else(|| SourceError::BadResponse("missing USDT market cap".into()))?;
        let usdc = cap("usd-coin").unwrap_or(0.0);

        Ok(round4((usdt + usdc) / btc))
    }

    /// Daily ratio series over the provider's 365-day window, ascending.
    pub async fn ratio_history(&self) -> Result<Vec<(NaiveDate, f64)>, SourceError> {
        let btc = self.cap_history("bitcoin").await?;
        let usdt = self.cap_history("tether").await?;
        let usdc = self.cap_history("usd-coin").await.unwrap_or_default();

        let ratios: Vec<(NaiveDate, f64)> = btc
            .iter()
            .filter_map(|(date, btc_cap)| {
                let usdt_cap = usdt.get(date)?;
                let usdc_cap = usdc.get(date).copied().unwrap_or(0.0);
                if *btc_cap <= 0.0 {
                    return None;
                }
                Some((*date, round4((usdt_cap + usdc_cap) / btc_cap)))
            })
            .collect();

        if ratios.is_empty() {
            return Err(SourceError::BadResponse(
                "no overlapping market-cap history".into(),
            ));
        }
        Ok(ratios)
    }

    async fn cap_history(&self, coin: &str) -> Result<BTreeMap<NaiveDate, f64>, SourceError> {
        let url = format!("{CHART_URL}/{coin}/market_chart");
        let chart = self
            .bulk_client
            .get(&url)
            .query(&[
                ("vs_currency", "usd"),
                ("days", &HISTORY_DAYS.to_string()),
                ("interval", "daily"),
            ])
            .send()
            .await
            .map_err(SourceError::network)?
            .json::<MarketChart>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        // intraday duplicates collapse to the last sample per UTC date
        let mut by_date = BTreeMap::new();
        for (ts_ms, cap) in chart.market_caps {
            let Some(cap) = cap else { continue };
            let Some(ts) = DateTime::from_timestamp_millis(ts_ms as i64) else {
                continue;
            };
            by_date.insert(ts.date_naive(), cap);
        }
        Ok(by_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_rounding() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(0.25), 0.25);
    }
}
