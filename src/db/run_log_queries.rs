use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::RunLogEntry;

/// Lookup backing the orchestrator's idempotency guard.
pub async fn find_success_for_date(
    pool: &PgPool,
    run_date: NaiveDate,
) -> Result<Option<RunLogEntry>, sqlx::Error> {
    sqlx::query_as::<_, RunLogEntry>(
        r#"
        SELECT id, run_date, status, detail, duration_ms, created_at
        FROM run_log
        WHERE run_date = $1 AND status = 'success'
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(run_date)
    .fetch_optional(pool)
    .await
}

/// Append-only; one row per orchestrator execution.
pub async fn insert(
    pool: &PgPool,
    run_date: NaiveDate,
    status: &str,
    detail: &serde_json::Value,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO run_log (run_date, status, detail, duration_ms)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(run_date)
    .bind(status)
    .bind(detail)
    .bind(duration_ms)
    .execute(pool)
    .await?;
    Ok(())
}
