//! Tenant store: source of the tenant→profile index.

use crate::models::Tenant;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// Read access to the tenant table.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Every known tenant, routable or not.
    async fn find_all_tenants(&self) -> Result<Vec<Tenant>>;
}

/// Postgres-backed tenant store.
pub struct PgTenantStore {
    pool: PgPool,
}

impl PgTenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TenantRecord {
    id: i64,
    profile_id: Option<i64>,
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn find_all_tenants(&self) -> Result<Vec<Tenant>> {
        let records = sqlx::query_as::<_, TenantRecord>(
            r#"
            SELECT id, profile_id
            FROM tenants
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch tenants")?;

        Ok(records
            .into_iter()
            .map(|r| Tenant {
                id: r.id.to_string(),
                profile_id: r.profile_id,
            })
            .collect())
    }
}
