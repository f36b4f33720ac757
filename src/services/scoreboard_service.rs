//! Read-side composition: the current scoreboard (rankings, deltas,
//! per-component scores) and the per-country history. Component scores
//! are recomputed from raw values against the *current* normalization
//! params, so a quarterly rebuild can shift historical components
//! without touching stored stress scores.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;

use crate::db::{country_queries, normalization_queries, observation_queries};
use crate::errors::AppError;
use crate::models::{DailyObservation, NormalizationParam};
use crate::services::indicators::round1;
use crate::services::scoring::component_scores;

/// Rows returned by the history endpoint.
const HISTORY_LIMIT: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct ScoreboardEntry {
    pub country_id: i64,
    pub country: String,
    pub code: String,
    pub date: NaiveDate,
    pub stress_score: f64,
    pub rank: usize,
    pub delta_7d: Option<f64>,
    pub delta_30d: Option<f64>,
    pub components: BTreeMap<&'static str, Option<f64>>,
    pub partial: bool,
    pub missing: Vec<String>,
    pub low_confidence: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub stress_score: f64,
    pub components: BTreeMap<&'static str, Option<f64>>,
}

pub async fn current_scoreboard(pool: &PgPool) -> Result<Vec<ScoreboardEntry>, AppError> {
    let countries = country_queries::fetch_all(pool).await?;
    let norms = load_norms(pool).await?;

    let mut entries: Vec<ScoreboardEntry> = Vec::new();
    for country in &countries {
        let Some(latest) = observation_queries::latest_scored(pool, country.id).await? else {
            continue;
        };
        let score = match latest.stress_score {
            Some(score) => score,
            None => continue,
        };

        let delta_7d = delta_against(pool, country.id, &latest, 7, score).await?;
        let delta_30d = delta_against(pool, country.id, &latest, 30, score).await?;

        let country_norms = norms.get(&country.id).map(Vec::as_slice).unwrap_or(&[]);
        let components = component_scores(&latest.raw_metrics(), country_norms);
        let (partial, missing, low_confidence) = read_flags(&latest);

        entries.push(ScoreboardEntry {
            country_id: country.id,
            country: country.name.clone(),
            code: country.iso2.clone(),
            date: latest.date,
            stress_score: score,
            rank: 0,
            delta_7d,
            delta_30d,
            components,
            partial,
            missing,
            low_confidence,
        });
    }

    assign_ranks(&mut entries);
    Ok(entries)
}

/// History for one country; `None` means the code is unknown.
pub async fn country_history(
    pool: &PgPool,
    iso2: &str,
) -> Result<Option<Vec<HistoryPoint>>, AppError> {
    let Some(country) = country_queries::find_by_iso2(pool, iso2).await? else {
        return Ok(None);
    };
    let norms = load_norms(pool).await?;
    let country_norms = norms.get(&country.id).map(Vec::as_slice).unwrap_or(&[]);

    let rows = observation_queries::scored_history(pool, country.id, HISTORY_LIMIT).await?;
    let points = rows
        .into_iter()
        .filter_map(|row| {
            let score = row.stress_score?;
            Some(HistoryPoint {
                date: row.date,
                stress_score: score,
                components: component_scores(&row.raw_metrics(), country_norms),
            })
        })
        .collect();
    Ok(Some(points))
}

async fn load_norms(pool: &PgPool) -> Result<HashMap<i64, Vec<NormalizationParam>>, AppError> {
    let mut by_country: HashMap<i64, Vec<NormalizationParam>> = HashMap::new();
    for param in normalization_queries::fetch_all(pool).await? {
        by_country.entry(param.country_id).or_default().push(param);
    }
    Ok(by_country)
}

async fn delta_against(
    pool: &PgPool,
    country_id: i64,
    latest: &DailyObservation,
    days: u64,
    score: f64,
) -> Result<Option<f64>, AppError> {
    let cutoff = latest.date - Days::new(days);
    let baseline =
        observation_queries::latest_scored_at_or_before(pool, country_id, cutoff).await?;
    // no historical row means no delta, not a delta of zero
    Ok(baseline
        .and_then(|row| row.stress_score)
        .map(|old| round1(score - old)))
}

fn read_flags(row: &DailyObservation) -> (bool, Vec<String>, bool) {
    let flags = row.data_flags.as_ref();
    let get_bool = |key: &str| {
        flags
            .and_then(|f| f.get(key))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    };
    let missing = flags
        .and_then(|f| f.get("missing"))
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    (get_bool("partial"), missing, get_bool("low_confidence"))
}

/// Sort by stress score descending and assign 1-based ranks. Ties
/// resolve by country id, which keeps the ordering deterministic across
/// calls.
pub fn assign_ranks(entries: &mut [ScoreboardEntry]) {
    entries.sort_by(|a, b| {
        b.stress_score
            .partial_cmp(&a.stress_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.country_id.cmp(&b.country_id))
    });
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(country_id: i64, score: f64) -> ScoreboardEntry {
        ScoreboardEntry {
            country_id,
            country: format!("Country {country_id}"),
            code: "XX".into(),
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            stress_score: score,
            rank: 0,
            delta_7d: None,
            delta_30d: None,
            components: BTreeMap::new(),
            partial: false,
            missing: Vec::new(),
            low_confidence: false,
        }
    }

    #[test]
    fn ranks_descend_by_score() {
        let mut entries = vec![entry(1, 20.0), entry(2, 80.0), entry(3, 50.0)];
        assign_ranks(&mut entries);
        let order: Vec<i64> = entries.iter().map(|e| e.country_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[2].rank, 3);
    }

    #[test]
    fn ties_resolve_by_country_id() {
        let mut entries = vec![entry(7, 50.0), entry(3, 50.0), entry(5, 50.0)];
        assign_ranks(&mut entries);
        let order: Vec<i64> = entries.iter().map(|e| e.country_id).collect();
        assert_eq!(order, vec![3, 5, 7]);
    }
}
