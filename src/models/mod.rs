mod country;
mod metrics;
mod normalization;
mod observation;
mod run_log;

pub use country::Country;
pub use metrics::{Metric, RawMetrics};
pub use normalization::NormalizationParam;
pub use observation::{DailyObservation, ObservationUpsert};
pub use run_log::{RunLogEntry, RunStatus};
