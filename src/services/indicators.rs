//! Numeric primitives shared by the scoring engine and the backfill
//! reducers. Pure and deterministic; rolling functions return a vector
//! aligned with the input, `None` until the window is filled.

/// Fraction of a rolling window that must be non-null before the
/// aggregate is emitted.
const MIN_WINDOW_COVERAGE: f64 = 0.8;

/// Linear map of `v` into [0, 1] with clamping outside [lo, hi].
/// A degenerate window (`hi == lo`) yields 0.5.
pub fn clamp_normalize(v: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return 0.5;
    }
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Round to one decimal digit.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Rolling sample standard deviation of log returns over `closes`
/// (ordered ascending), window of `window` returns.
///
/// Position `i` is `None` when fewer than `window` prior observations
/// exist, or when fewer than 80% of the window's returns are available
/// (a return is unavailable when either close is non-positive).
pub fn rolling_std_log_returns(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    if window < 2 || n == 0 {
        return vec![None; n];
    }

    // returns[i] pairs with closes[i]; index 0 has no prior close
    let returns: Vec<Option<f64>> = std::iter::once(None)
        .chain(closes.windows(2).map(|pair| {
            let (prev, cur) = (pair[0], pair[1]);
            if prev > 0.0 && cur > 0.0 {
                Some((cur / prev).ln())
            } else {
                None
            }
        }))
        .collect();

    (0..n)
        .map(|i| {
            if i < window {
                return None;
            }
            window_sample_std(&returns[i + 1 - window..=i], window)
        })
        .collect()
}

fn window_sample_std(window_vals: &[Option<f64>], window: usize) -> Option<f64> {
    let present: Vec<f64> = window_vals.iter().flatten().copied().collect();
    if (present.len() as f64) < MIN_WINDOW_COVERAGE * window as f64 || present.len() < 2 {
        return None;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Rolling mean with the same 80%-coverage gating as
/// [`rolling_std_log_returns`].
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    if window == 0 {
        return vec![None; n];
    }
    (0..n)
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let present: Vec<f64> = slice.iter().flatten().copied().collect();
            if (present.len() as f64) < MIN_WINDOW_COVERAGE * window as f64 {
                return None;
            }
            Some(present.iter().sum::<f64>() / present.len() as f64)
        })
        .collect()
}

/// Percent change of `v` against `reference`; `None` when the reference
/// is absent or zero.
pub fn pct_change(v: f64, reference: Option<f64>) -> Option<f64> {
    match reference {
        Some(r) if r != 0.0 => Some((v - r) / r.abs() * 100.0),
        _ => None,
    }
}

/// Percentile `p` (0–100) of `values` by linear interpolation over the
/// sorted sample. Returns `None` on an empty input.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let frac = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Median of a non-empty sample.
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_normalize_inside_range() {
        assert!((clamp_normalize(0.030, 0.01, 0.04) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(clamp_normalize(3.0, 0.0, 6.0), 0.5);
    }

    #[test]
    fn clamp_normalize_clamps_outside_range() {
        assert_eq!(clamp_normalize(-1.0, 0.0, 5.0), 0.0);
        assert_eq!(clamp_normalize(9.0, 0.0, 5.0), 1.0);
    }

    #[test]
    fn clamp_normalize_degenerate_window_is_half() {
        assert_eq!(clamp_normalize(0.02, 0.02, 0.02), 0.5);
    }

    #[test]
    fn clamp_normalize_is_monotone_and_idempotent_on_unit_range() {
        let samples = [-0.5, 0.0, 0.2, 0.7, 1.0, 1.5];
        let mut prev = f64::NEG_INFINITY;
        for v in samples {
            let out = clamp_normalize(v, 0.0, 1.0);
            assert!(out >= prev);
            prev = out;
            // applying twice over the identity range changes nothing
            assert_eq!(clamp_normalize(out, 0.0, 1.0), out);
        }
    }

    #[test]
    fn rolling_std_needs_full_window() {
        let closes: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let out = rolling_std_log_returns(&closes, 5);
        assert_eq!(out.len(), 10);
        assert!(out[..5].iter().all(|v| v.is_none()));
        assert!(out[5..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn rolling_std_matches_hand_computation() {
        // constant multiplicative growth: all log returns equal, std 0
        let closes: Vec<f64> = (0..8).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let out = rolling_std_log_returns(&closes, 5);
        let last = out.last().unwrap().unwrap();
        assert!(last.abs() < 1e-12);
    }

    #[test]
    fn rolling_std_known_sample() {
        let closes = vec![100.0, 101.0, 99.0, 102.0, 100.0];
        let out = rolling_std_log_returns(&closes, 4);
        // returns: ln(101/100), ln(99/101), ln(102/99), ln(100/102)
        let r = [
            (101.0f64 / 100.0).ln(),
            (99.0f64 / 101.0).ln(),
            (102.0f64 / 99.0).ln(),
            (100.0f64 / 102.0).ln(),
        ];
        let mean = r.iter().sum::<f64>() / 4.0;
        let var = r.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!((out[4].unwrap() - var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rolling_std_gates_on_coverage() {
        // a zero close voids its two adjacent returns; 2 of 4 < 80%
        let closes = vec![100.0, 101.0, 0.0, 102.0, 100.0];
        let out = rolling_std_log_returns(&closes, 4);
        assert_eq!(out[4], None);
    }

    #[test]
    fn rolling_mean_gating() {
        let vals: Vec<Option<f64>> =
            vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)];
        let out = rolling_mean(&vals, 4);
        // window [1,2,None,4]: 3/4 = 75% coverage, below the gate
        assert_eq!(out[3], None);
        // window [2,None,4,5] also 75%
        assert_eq!(out[4], None);

        let dense: Vec<Option<f64>> = (1..=4).map(|i| Some(i as f64)).collect();
        assert_eq!(rolling_mean(&dense, 4)[3], Some(2.5));
    }

    #[test]
    fn pct_change_null_reference() {
        assert_eq!(pct_change(5.0, None), None);
        assert_eq!(pct_change(5.0, Some(0.0)), None);
        assert_eq!(pct_change(95.0, Some(100.0)), Some(-5.0));
        // negative reference uses its absolute value
        assert_eq!(pct_change(-90.0, Some(-100.0)), Some(10.0));
    }

    #[test]
    fn percentile_linear_interpolation() {
        let values = vec![10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&values, 0.0), Some(10.0));
        assert_eq!(percentile(&values, 100.0), Some(40.0));
        assert_eq!(percentile(&values, 50.0), Some(25.0));
        // rank = 0.05 * 3 = 0.15 -> 10 + 0.15 * 10
        assert!((percentile(&values, 5.0).unwrap() - 11.5).abs() < 1e-12);
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn round1_single_decimal() {
        assert_eq!(round1(45.784), 45.8);
        assert_eq!(round1(82.22), 82.2);
        assert_eq!(round1(50.0), 50.0);
    }
}
