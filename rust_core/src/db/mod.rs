//! Database access for the routing core.
//!
//! One small connection pool plus the store adapters the router consumes:
//! - tenant lookups for the tenant→profile index
//! - the boosted-markets catalog
//! - the optional feed log sink
//! - primary-market mappings for the in-memory cache

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::time::Duration;

pub mod boosts;
pub mod feed_log;
pub mod market_mappings;
pub mod tenants;

/// The router holds few connections: the tenant refresher, boost lookups and
/// the feed log writer are its only query paths.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect a pool sized for the router's query paths.
///
/// `DB_MAX_CONNECTIONS` and `DB_ACQUIRE_TIMEOUT_SECS` override the defaults.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let max_connections = env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS);

    let acquire_timeout = env::var("DB_ACQUIRE_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .context("Failed to create database connection pool")?;

    tracing::info!(
        "Database pool created: max={}, acquire_timeout={}s",
        max_connections,
        acquire_timeout.as_secs()
    );

    Ok(pool)
}
