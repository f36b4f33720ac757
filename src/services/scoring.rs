//! The stress-score engine: maps a raw metric tuple plus a country's
//! normalization bounds to a 0–100 score, redistributing the canonical
//! weight of missing metrics across the ones that are present.
//!
//! Redistribution keeps the score auditable (no imputation); callers
//! must surface `low_confidence` whenever less than half the canonical
//! weight is backed by data.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::models::{Metric, NormalizationParam, RawMetrics};
use crate::services::indicators::{clamp_normalize, round1};

/// Available weight below which a score is flagged low-confidence.
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Result of one scoring call. `score` is in [0, 100] with one decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub score: f64,
    pub partial: bool,
    pub missing: Vec<&'static str>,
    pub low_confidence: bool,
    /// Metrics whose raw value was present but had no normalization row.
    pub norm_missing: Vec<&'static str>,
}

impl ScoreOutcome {
    /// Audit flags for the row's `data_flags` bag.
    pub fn flags(&self) -> Map<String, Value> {
        let mut flags = Map::new();
        if self.partial {
            flags.insert("partial".into(), json!(true));
            flags.insert("missing".into(), json!(self.missing));
        }
        if self.low_confidence {
            flags.insert("low_confidence".into(), json!(true));
        }
        for name in &self.norm_missing {
            flags.insert(format!("{name}_norm_missing"), json!(true));
        }
        flags
    }
}

fn bounds_for(norms: &[NormalizationParam], metric: Metric) -> Option<(f64, f64)> {
    norms
        .iter()
        .find(|n| n.metric_name == metric.name())
        .map(|n| (n.min_val, n.max_val))
}

/// Compute the stress score for one raw metric tuple.
///
/// A metric contributes only when its raw value is present AND a
/// normalization row exists; everything else has its canonical weight
/// redistributed. Returns `None` when no metric at all is available:
/// the row cannot be scored (distinct from a score of 0).
pub fn compute_stress_score(
    raw: &RawMetrics,
    norms: &[NormalizationParam],
) -> Option<ScoreOutcome> {
    let mut available: Vec<(Metric, f64)> = Vec::new();
    let mut missing: Vec<&'static str> = Vec::new();
    let mut norm_missing: Vec<&'static str> = Vec::new();

    for metric in Metric::ALL {
        match (raw.get(metric), bounds_for(norms, metric)) {
            (Some(value), Some((lo, hi))) => {
                available.push((metric, clamp_normalize(value, lo, hi)));
            }
            (Some(_), None) => {
                norm_missing.push(metric.name());
                missing.push(metric.name());
            }
            (None, _) => missing.push(metric.name()),
        }
    }

    let available_weight: f64 = available.iter().map(|(m, _)| m.weight()).sum();
    if available_weight == 0.0 {
        return None;
    }

    let weighted: f64 = available
        .iter()
        .map(|(m, component)| m.weight() / available_weight * component)
        .sum();

    Some(ScoreOutcome {
        score: round1(100.0 * weighted),
        partial: !missing.is_empty(),
        missing,
        low_confidence: available_weight < LOW_CONFIDENCE_THRESHOLD,
        norm_missing,
    })
}

/// Per-metric normalized scores (0–100, one decimal) for presentation.
/// `None` for metrics lacking a raw value or a normalization row.
pub fn component_scores(
    raw: &RawMetrics,
    norms: &[NormalizationParam],
) -> BTreeMap<&'static str, Option<f64>> {
    Metric::ALL
        .into_iter()
        .map(|metric| {
            let score = raw
                .get(metric)
                .zip(bounds_for(norms, metric))
                .map(|(value, (lo, hi))| round1(100.0 * clamp_normalize(value, lo, hi)));
            (metric.name(), score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn norm(metric: Metric, lo: f64, hi: f64) -> NormalizationParam {
        NormalizationParam {
            id: 0,
            country_id: 1,
            metric_name: metric.name().to_string(),
            min_val: lo,
            max_val: hi,
            method: "p5_p95_clamped".to_string(),
            window_start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            window_end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            updated_at: Utc::now(),
        }
    }

    fn full_norms() -> Vec<NormalizationParam> {
        vec![
            norm(Metric::FxVol, 0.01, 0.04),
            norm(Metric::Inflation, 0.0, 5.0),
            norm(Metric::RiskSpread, 0.0, 6.0),
            norm(Metric::CryptoRatio, 0.1, 0.5),
            norm(Metric::ReservesChange, -10.0, 10.0),
            norm(Metric::StablecoinPremium, 0.0, 50.0),
        ]
    }

    #[test]
    fn all_metrics_present_uses_canonical_weights() {
        let raw = RawMetrics {
            fx_vol: Some(0.025),
            inflation: Some(2.5),
            risk_spread: Some(3.0),
            crypto_ratio: Some(0.3),
            reserves_change: Some(0.0),
            stablecoin_premium: Some(25.0),
        };
        let out = compute_stress_score(&raw, &full_norms()).unwrap();
        // every component is exactly 0.5, so the score is 50 regardless
        // of weighting, and nothing was redistributed
        assert_eq!(out.score, 50.0);
        assert!(!out.partial);
        assert!(!out.low_confidence);
        assert!(out.missing.is_empty());
    }

    #[test]
    fn redistributed_weights_sum_to_one() {
        let raw = RawMetrics {
            fx_vol: Some(0.030),
            inflation: Some(1.5),
            risk_spread: None,
            crypto_ratio: Some(0.25),
            reserves_change: None,
            stablecoin_premium: None,
        };
        let norms = full_norms();
        let available = [Metric::FxVol, Metric::Inflation, Metric::CryptoRatio];
        let available_weight: f64 = available.iter().map(|m| m.weight()).sum();
        let adjusted: f64 = available
            .iter()
            .map(|m| m.weight() / available_weight)
            .sum();
        assert!((adjusted - 1.0).abs() < 1e-9);
        assert!(compute_stress_score(&raw, &norms).is_some());
    }

    #[test]
    fn single_metric_gets_full_weight() {
        let raw = RawMetrics {
            inflation: Some(3.0),
            ..Default::default()
        };
        let out = compute_stress_score(&raw, &full_norms()).unwrap();
        // 3.0 in [0, 5] -> 0.6 -> 60.0 with its adjusted weight at 1
        assert_eq!(out.score, 60.0);
        assert!(out.partial);
        assert!(out.low_confidence);
        assert_eq!(out.missing.len(), 5);
    }

    #[test]
    fn no_metrics_yields_no_score() {
        let out = compute_stress_score(&RawMetrics::default(), &full_norms());
        assert!(out.is_none());
    }

    #[test]
    fn value_without_norm_row_is_redistributed_and_flagged() {
        let raw = RawMetrics {
            fx_vol: Some(0.030),
            inflation: Some(1.5),
            ..Default::default()
        };
        let norms = vec![norm(Metric::FxVol, 0.01, 0.04)];
        let out = compute_stress_score(&raw, &norms).unwrap();
        assert_eq!(out.norm_missing, vec!["inflation"]);
        assert!(out.missing.contains(&"inflation"));
        // fx_vol alone: (0.03-0.01)/0.03 = 2/3 -> 66.7
        assert_eq!(out.score, 66.7);
        let flags = out.flags();
        assert_eq!(flags.get("inflation_norm_missing"), Some(&json!(true)));
        assert_eq!(flags.get("partial"), Some(&json!(true)));
    }

    #[test]
    fn clamping_at_both_ends() {
        let below = RawMetrics {
            fx_vol: Some(0.001),
            ..Default::default()
        };
        let above = RawMetrics {
            fx_vol: Some(0.9),
            ..Default::default()
        };
        let norms = full_norms();
        assert_eq!(compute_stress_score(&below, &norms).unwrap().score, 0.0);
        assert_eq!(compute_stress_score(&above, &norms).unwrap().score, 100.0);
    }

    #[test]
    fn low_confidence_exactly_below_half() {
        // fx_vol + inflation: 0.45 available weight
        let raw = RawMetrics {
            fx_vol: Some(0.02),
            inflation: Some(2.0),
            ..Default::default()
        };
        let out = compute_stress_score(&raw, &full_norms()).unwrap();
        assert!(out.low_confidence);

        // inflation + risk_spread + crypto_ratio: exactly 0.5, the
        // threshold is strict
        let raw = RawMetrics {
            inflation: Some(2.0),
            risk_spread: Some(1.0),
            crypto_ratio: Some(0.3),
            ..Default::default()
        };
        let out = compute_stress_score(&raw, &full_norms()).unwrap();
        assert!(!out.low_confidence);

        // fx_vol + inflation + risk_spread: 0.65
        let raw = RawMetrics {
            fx_vol: Some(0.02),
            inflation: Some(2.0),
            risk_spread: Some(1.0),
            ..Default::default()
        };
        let out = compute_stress_score(&raw, &full_norms()).unwrap();
        assert!(!out.low_confidence);
    }

    #[test]
    fn scoring_is_deterministic() {
        let raw = RawMetrics {
            fx_vol: Some(0.030),
            inflation: Some(1.5),
            risk_spread: Some(3.0),
            ..Default::default()
        };
        let norms = full_norms();
        let a = compute_stress_score(&raw, &norms).unwrap();
        let b = compute_stress_score(&raw, &norms).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn component_scores_null_without_data_or_norms() {
        let raw = RawMetrics {
            fx_vol: Some(0.030),
            inflation: Some(1.5),
            ..Default::default()
        };
        let norms = vec![norm(Metric::FxVol, 0.01, 0.04)];
        let components = component_scores(&raw, &norms);
        assert_eq!(components["fx_vol"], Some(66.7));
        assert_eq!(components["inflation"], None); // no norm row
        assert_eq!(components["risk_spread"], None); // no value
        assert_eq!(components.len(), 6);
    }
}
