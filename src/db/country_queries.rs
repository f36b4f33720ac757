use sqlx::PgPool;

use crate::models::Country;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Country>, sqlx::Error> {
    sqlx::query_as::<_, Country>(
        r#"
        SELECT id, name, iso2, iso3, imf_code, currency, primary_source_series_id
        FROM countries
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn find_by_iso2(pool: &PgPool, iso2: &str) -> Result<Option<Country>, sqlx::Error> {
    sqlx::query_as::<_, Country>(
        r#"
        SELECT id, name, iso2, iso3, imf_code, currency, primary_source_series_id
        FROM countries
        WHERE iso2 = $1
        "#,
    )
    .bind(iso2)
    .fetch_optional(pool)
    .await
}
