//! Primary-market mapping rows, loaded once at boot into the in-memory cache.

use anyhow::{Context, Result};
use sqlx::PgPool;

#[derive(sqlx::FromRow)]
struct MappingRecord {
    market_id: i64,
    sport_urn: String,
}

/// Fetch every `(market_id, sport_urn)` pair flagged as primary.
pub async fn load_all(pool: &PgPool) -> Result<Vec<(i64, String)>> {
    let records = sqlx::query_as::<_, MappingRecord>(
        r#"
        SELECT market_id, sport_urn
        FROM market_mappings
        WHERE is_primary = TRUE
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch market mappings")?;

    Ok(records
        .into_iter()
        .map(|r| (r.market_id, r.sport_urn))
        .collect())
}
