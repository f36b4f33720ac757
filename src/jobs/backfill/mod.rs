//! One-shot historical ingestors. Each reducer pulls a long series from
//! its source family, expands sparse monthly/annual observations into
//! dense per-day rows by forward-fill, and upserts in batches. Offline
//! only; the daily pipeline keeps the data fresh afterwards.

pub mod crypto_backfill;
pub mod fx_backfill;
pub mod inflation_backfill;
pub mod reserves_backfill;
pub mod sovereign_backfill;

use chrono::{Days, NaiveDate};
use tokio::time::{sleep, Duration};

/// Polite pause between per-country provider calls.
pub(crate) const INTER_COUNTRY_DELAY: Duration = Duration::from_millis(1500);

/// First date covered by historical ingestion (non-crypto sources).
pub fn history_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid anchor date")
}

pub(crate) async fn polite_delay() {
    sleep(INTER_COUNTRY_DELAY).await;
}

/// Expand a sparse ascending series to one value per calendar day in
/// [first point, `end`], each day carrying the latest value at or
/// before it.
pub(crate) fn forward_fill_daily(
    points: &[(NaiveDate, f64)],
    end: NaiveDate,
) -> Vec<(NaiveDate, f64)> {
    let Some(&(start, _)) = points.first() else {
        return Vec::new();
    };

    let mut filled = Vec::new();
    let mut idx = 0usize;
    let mut current = points[0].1;
    let mut day = start;
    while day <= end {
        while idx + 1 < points.len() && points[idx + 1].0 <= day {
            idx += 1;
            current = points[idx].1;
        }
        filled.push((day, current));
        day = day + Days::new(1);
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn forward_fill_carries_latest_value() {
        let points = vec![(d(2024, 1, 1), 10.0), (d(2024, 1, 5), 20.0)];
        let filled = forward_fill_daily(&points, d(2024, 1, 7));
        assert_eq!(filled.len(), 7);
        assert_eq!(filled[0], (d(2024, 1, 1), 10.0));
        assert_eq!(filled[3], (d(2024, 1, 4), 10.0));
        assert_eq!(filled[4], (d(2024, 1, 5), 20.0));
        assert_eq!(filled[6], (d(2024, 1, 7), 20.0));
    }

    #[test]
    fn forward_fill_empty_input() {
        assert!(forward_fill_daily(&[], d(2024, 1, 1)).is_empty());
    }
}
