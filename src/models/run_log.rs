use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Partial,
    Error,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Error => "error",
        }
    }
}

// Append-only record of one orchestrator execution.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RunLogEntry {
    pub id: i64,
    pub run_date: NaiveDate,
    pub status: String,
    pub detail: Option<serde_json::Value>,
    pub duration_ms: i64,
    pub created_at: DateTime<Utc>,
}
