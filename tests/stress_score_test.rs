/// End-to-end scoring scenarios: realistic metric tuples for tracked
/// countries run through the full engine, asserting scores, flags and
/// the structural invariants every scored row must satisfy.
use chrono::{NaiveDate, Utc};

use stressmap_backend::models::{Metric, NormalizationParam, RawMetrics};
use stressmap_backend::services::scoring::{component_scores, compute_stress_score};

fn norm(metric: Metric, lo: f64, hi: f64) -> NormalizationParam {
    NormalizationParam {
        id: 0,
        country_id: 1,
        metric_name: metric.name().to_string(),
        min_val: lo,
        max_val: hi,
        method: "p5_p95_clamped".to_string(),
        window_start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
        window_end: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        updated_at: Utc::now(),
    }
}

fn brazil_norms() -> Vec<NormalizationParam> {
    vec![
        norm(Metric::FxVol, 0.01, 0.04),
        norm(Metric::Inflation, 0.0, 5.0),
        norm(Metric::RiskSpread, 0.0, 6.0),
        norm(Metric::CryptoRatio, 0.1, 0.5),
        norm(Metric::ReservesChange, -10.0, 10.0),
    ]
}

#[test]
fn five_metric_country_scores_without_stablecoin_premium() {
    // Brazil-shaped inputs: every metric except the (inapplicable)
    // stablecoin premium. Components: 0.667, 0.300, 0.500, 0.375, 0.250.
    let raw = RawMetrics {
        fx_vol: Some(0.030),
        inflation: Some(1.5),
        risk_spread: Some(3.0),
        crypto_ratio: Some(0.25),
        reserves_change: Some(-5.0),
        stablecoin_premium: None,
    };
    let out = compute_stress_score(&raw, &brazil_norms()).unwrap();

    // weighted sum 0.3891667 over 0.85 available weight
    assert_eq!(out.score, 45.8);
    assert!(out.partial);
    assert_eq!(out.missing, vec!["stablecoin_premium"]);
    assert!(!out.low_confidence); // 0.85 >= 0.5
}

#[test]
fn two_metric_country_is_low_confidence() {
    // fx_vol clamps to 1.0 above its p95; inflation normalizes to 0.6
    let raw = RawMetrics {
        fx_vol: Some(0.05),
        inflation: Some(3.0),
        ..Default::default()
    };
    let out = compute_stress_score(&raw, &brazil_norms()).unwrap();

    // (0.25 * 1.0 + 0.20 * 0.6) / 0.45 = 0.8222
    assert_eq!(out.score, 82.2);
    assert!(out.low_confidence);
    assert!(out.partial);
    assert_eq!(out.missing.len(), 4);
}

#[test]
fn degenerate_history_scores_midpoint() {
    // flat history: p5 == p95, the component pins to 0.5
    let raw = RawMetrics {
        fx_vol: Some(0.02),
        ..Default::default()
    };
    let norms = vec![norm(Metric::FxVol, 0.02, 0.02)];
    let out = compute_stress_score(&raw, &norms).unwrap();

    assert_eq!(out.score, 50.0);
    assert!(out.low_confidence);
}

#[test]
fn empty_tuple_is_unscorable_not_zero() {
    assert!(compute_stress_score(&RawMetrics::default(), &brazil_norms()).is_none());
}

#[test]
fn scores_stay_in_bounds_with_one_decimal() {
    let values = [-100.0, -5.0, 0.0, 0.015, 0.25, 3.0, 42.0, 1e6];
    for fx in values {
        for spread in values {
            let raw = RawMetrics {
                fx_vol: Some(fx),
                risk_spread: Some(spread),
                ..Default::default()
            };
            let out = compute_stress_score(&raw, &brazil_norms()).unwrap();
            assert!((0.0..=100.0).contains(&out.score));
            // one decimal digit of resolution
            assert!(((out.score * 10.0).round() - out.score * 10.0).abs() < 1e-9);
        }
    }
}

#[test]
fn component_scores_track_engine_normalization() {
    let raw = RawMetrics {
        fx_vol: Some(0.030),
        inflation: Some(1.5),
        risk_spread: Some(3.0),
        crypto_ratio: Some(0.25),
        reserves_change: Some(-5.0),
        stablecoin_premium: Some(12.0), // present but no norm row
    };
    let components = component_scores(&raw, &brazil_norms());

    assert_eq!(components["fx_vol"], Some(66.7));
    assert_eq!(components["inflation"], Some(30.0));
    assert_eq!(components["risk_spread"], Some(50.0));
    assert_eq!(components["crypto_ratio"], Some(37.5));
    assert_eq!(components["reserves_change"], Some(25.0));
    assert_eq!(components["stablecoin_premium"], None);
}

#[test]
fn rescoring_identical_inputs_is_identical() {
    let raw = RawMetrics {
        fx_vol: Some(0.030),
        inflation: Some(1.5),
        risk_spread: Some(3.0),
        crypto_ratio: Some(0.25),
        reserves_change: Some(-5.0),
        stablecoin_premium: None,
    };
    let norms = brazil_norms();
    assert_eq!(
        compute_stress_score(&raw, &norms),
        compute_stress_score(&raw, &norms)
    );
}
