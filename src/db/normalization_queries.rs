use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::NormalizationParam;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<NormalizationParam>, sqlx::Error> {
    sqlx::query_as::<_, NormalizationParam>(
        r#"
        SELECT id, country_id, metric_name, min_val, max_val, method,
               window_start, window_end, updated_at
        FROM normalization_params
        ORDER BY country_id, metric_name
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn upsert(
    pool: &PgPool,
    country_id: i64,
    metric_name: &str,
    min_val: f64,
    max_val: f64,
    method: &str,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO normalization_params
            (country_id, metric_name, min_val, max_val, method, window_start, window_end)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (country_id, metric_name) DO UPDATE SET
            min_val = EXCLUDED.min_val,
            max_val = EXCLUDED.max_val,
            method = EXCLUDED.method,
            window_start = EXCLUDED.window_start,
            window_end = EXCLUDED.window_end,
            updated_at = NOW()
        "#,
    )
    .bind(country_id)
    .bind(metric_name)
    .bind(min_val)
    .bind(max_val)
    .bind(method)
    .bind(window_start)
    .bind(window_end)
    .execute(pool)
    .await?;
    Ok(())
}
