//! Source adapters. One module per provider; each owns exactly one
//! provider call, enforces an explicit timeout, and returns a typed
//! result or an error the pipeline downgrades to a null metric.

pub mod crypto;
pub mod fred;
pub mod fx;
pub mod imf;
pub mod inflation;
pub mod parallel;
pub mod reserves;
pub mod risk_free;
pub mod sovereign;
pub mod stablecoin;

use std::time::Duration;

use thiserror::Error;

use crate::config::AppConfig;

/// Timeout for single-observation calls against free tiers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for bulk history pulls during backfill.
pub const BULK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("series not found")]
    NotFound,
}

impl SourceError {
    pub fn network(e: reqwest::Error) -> Self {
        SourceError::Network(e.to_string())
    }
}

/// Every provider the pipeline talks to, built once at startup and
/// shared read-only.
pub struct Sources {
    pub fx: fx::FxProvider,
    pub parallel: parallel::ParallelFxProvider,
    pub crypto: crypto::CryptoProvider,
    pub inflation: inflation::InflationProvider,
    pub sovereign: sovereign::SovereignYields,
    pub reserves: reserves::ReservesProvider,
    pub risk_free: risk_free::RiskFreeProvider,
    pub stablecoin: stablecoin::StablecoinProvider,
}

impl Sources {
    pub fn from_config(config: &AppConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        let bulk_client = reqwest::Client::builder().timeout(BULK_TIMEOUT).build()?;

        let fred = fred::FredClient::new(
            client.clone(),
            bulk_client.clone(),
            config.fred_api_key.clone(),
        );
        let imf = imf::ImfSdmxClient::new(bulk_client.clone());

        Ok(Self {
            fx: fx::FxProvider::new(
                client.clone(),
                bulk_client.clone(),
                config.alphavantage_api_key.clone(),
            ),
            parallel: parallel::ParallelFxProvider::new(client.clone()),
            crypto: crypto::CryptoProvider::new(client.clone(), bulk_client),
            inflation: inflation::InflationProvider::new(client.clone()),
            sovereign: sovereign::SovereignYields::new(fred.clone(), imf.clone()),
            reserves: reserves::ReservesProvider::new(imf),
            risk_free: risk_free::RiskFreeProvider::new(fred),
            stablecoin: stablecoin::StablecoinProvider::new(client),
        })
    }
}
