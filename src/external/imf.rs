use chrono::NaiveDate;
use serde_json::Value;

use crate::external::SourceError;

const BASE_URL: &str = "https://dataservices.imf.org/REST/SDMX_JSON.svc/CompactData/IFS";

/// SDMX-JSON client for the IMF IFS dataset. Serves the sovereign-yield
/// fallback and the reserves adapter. Free, keyless, and frequently
/// missing series for the smaller economies; callers must tolerate
/// `NotFound`.
#[derive(Clone)]
pub struct ImfSdmxClient {
    client: reqwest::Client,
}

impl ImfSdmxClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Monthly series `indicator` for IFS area `area_code`, ascending by
    /// period. Periods come back as "YYYY-MM"; each is pinned to the
    /// first of its month.
    pub async fn monthly_series(
        &self,
        area_code: &str,
        indicator: &str,
        start_period: &str,
    ) -> Result<Vec<(NaiveDate, f64)>, SourceError> {
        let url = format!("{BASE_URL}/M.{area_code}.{indicator}?startPeriod={start_period}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(SourceError::network)?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }

        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        // CompactData.DataSet.Series may be absent (unknown series), a
        // single object, or an array; Obs likewise.
        let series = body
            .pointer("/CompactData/DataSet/Series")
            .ok_or(SourceError::NotFound)?;
        let series = match series {
            Value::Array(items) => items.first().ok_or(SourceError::NotFound)?,
            other => other,
        };
        let observations = match series.get("Obs") {
            Some(Value::Array(items)) => items.clone(),
            Some(obj @ Value::Object(_)) => vec![obj.clone()],
            _ => return Err(SourceError::NotFound),
        };

        let mut points: Vec<(NaiveDate, f64)> = observations
            .iter()
            .filter_map(|obs| {
                let period = obs.get("@TIME_PERIOD")?.as_str()?;
                let value = obs.get("@OBS_VALUE")?.as_str()?.parse::<f64>().ok()?;
                let date =
                    NaiveDate::parse_from_str(&format!("{period}-01"), "%Y-%m-%d").ok()?;
                Some((date, value))
            })
            .collect();
        points.sort_by_key(|(date, _)| *date);

        if points.is_empty() {
            return Err(SourceError::NotFound);
        }
        Ok(points)
    }
}
