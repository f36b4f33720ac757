use tracing::warn;

/// Everything the service reads from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Primary macro source (FRED).
    pub fred_api_key: String,
    /// FX free tier (Alpha Vantage).
    pub alphavantage_api_key: String,
    /// Shared secret for the cron trigger endpoint.
    pub cron_secret: String,
    pub port: u16,
    pub enable_scheduler: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL not set".to_string())?;
        let cron_secret =
            std::env::var("CRON_SECRET").map_err(|_| "CRON_SECRET not set".to_string())?;

        let fred_api_key = std::env::var("FRED_API_KEY").unwrap_or_default();
        if fred_api_key.is_empty() {
            warn!("FRED_API_KEY not set; sovereign and risk-free fetches will fail");
        }
        let alphavantage_api_key = std::env::var("ALPHAVANTAGE_API_KEY").unwrap_or_default();
        if alphavantage_api_key.is_empty() {
            warn!("ALPHAVANTAGE_API_KEY not set; FX fetches will fail");
        }

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);
        let enable_scheduler = std::env::var("ENABLE_SCHEDULER")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        Ok(Self {
            database_url,
            fred_api_key,
            alphavantage_api_key,
            cron_secret,
            port,
            enable_scheduler,
        })
    }
}
