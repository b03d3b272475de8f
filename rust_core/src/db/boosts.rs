//! Boosted-markets catalog access.
//!
//! Queries are ordered by row id so that the router's first-seen merge of
//! duplicate market keys is stable across fetches.

use crate::models::BoostedMarketRow;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// Read access to the boosted-markets catalog.
///
/// Both queries distinguish "no boosts configured" (`Ok(vec![])`) from a
/// failed lookup (`Err`); the router never treats an error as empty.
#[async_trait]
pub trait BoostStore: Send + Sync {
    /// Boost rows for one profile and fixture.
    async fn find_by_profile_and_fixture(
        &self,
        profile_id: i64,
        fixture_urn: &str,
    ) -> Result<Vec<BoostedMarketRow>>;

    /// Boost rows across all profiles for the given fixtures.
    async fn find_by_fixtures(&self, fixture_urns: &[String]) -> Result<Vec<BoostedMarketRow>>;
}

/// Postgres-backed boost catalog.
pub struct PgBoostStore {
    pool: PgPool,
}

impl PgBoostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BoostStore for PgBoostStore {
    async fn find_by_profile_and_fixture(
        &self,
        profile_id: i64,
        fixture_urn: &str,
    ) -> Result<Vec<BoostedMarketRow>> {
        sqlx::query_as::<_, BoostedMarketRow>(
            r#"
            SELECT profile_id, market_id, market_specifier, strategy, percent
            FROM boosted_markets
            WHERE profile_id = $1 AND fixture_urn = $2
            ORDER BY id
            "#,
        )
        .bind(profile_id)
        .bind(fixture_urn)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch boosts for profile and fixture")
    }

    async fn find_by_fixtures(&self, fixture_urns: &[String]) -> Result<Vec<BoostedMarketRow>> {
        sqlx::query_as::<_, BoostedMarketRow>(
            r#"
            SELECT profile_id, market_id, market_specifier, strategy, percent
            FROM boosted_markets
            WHERE fixture_urn = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(fixture_urns)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch boosts for fixtures")
    }
}
