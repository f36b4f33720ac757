use serde::{Deserialize, Serialize};

/// The six scored metrics, in canonical weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    FxVol,
    Inflation,
    RiskSpread,
    CryptoRatio,
    ReservesChange,
    StablecoinPremium,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::FxVol,
        Metric::Inflation,
        Metric::RiskSpread,
        Metric::CryptoRatio,
        Metric::ReservesChange,
        Metric::StablecoinPremium,
    ];

    /// Canonical weights. Must sum to 1.0.
    pub fn weight(self) -> f64 {
        match self {
            Metric::FxVol => 0.25,
            Metric::Inflation => 0.20,
            Metric::RiskSpread => 0.20,
            Metric::CryptoRatio => 0.10,
            Metric::ReservesChange => 0.10,
            Metric::StablecoinPremium => 0.15,
        }
    }

    /// Column / flag name, matching `daily_observations` and
    /// `normalization_params.metric_name`.
    pub fn name(self) -> &'static str {
        match self {
            Metric::FxVol => "fx_vol",
            Metric::Inflation => "inflation",
            Metric::RiskSpread => "risk_spread",
            Metric::CryptoRatio => "crypto_ratio",
            Metric::ReservesChange => "reserves_change",
            Metric::StablecoinPremium => "stablecoin_premium",
        }
    }

    pub fn from_name(name: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.name() == name)
    }
}

/// The raw metric tuple fed to the scoring engine. Transient, never
/// persisted as-is. A missing metric is `None`; 0.0 is a real value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetrics {
    pub fx_vol: Option<f64>,
    pub inflation: Option<f64>,
    pub risk_spread: Option<f64>,
    pub crypto_ratio: Option<f64>,
    pub reserves_change: Option<f64>,
    pub stablecoin_premium: Option<f64>,
}

impl RawMetrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::FxVol => self.fx_vol,
            Metric::Inflation => self.inflation,
            Metric::RiskSpread => self.risk_spread,
            Metric::CryptoRatio => self.crypto_ratio,
            Metric::ReservesChange => self.reserves_change,
            Metric::StablecoinPremium => self.stablecoin_premium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_weights_sum_to_one() {
        let total: f64 = Metric::ALL.iter().map(|m| m.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn metric_names_round_trip() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_name(m.name()), Some(m));
        }
        assert_eq!(Metric::from_name("unknown"), None);
    }
}
