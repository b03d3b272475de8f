//! Feed log sink: archived copies of published messages.

use crate::models::FeedMessage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// Write access to the feed log document store.
#[async_trait]
pub trait FeedMessageStore: Send + Sync {
    async fn save(&self, entry: &FeedMessage) -> Result<()>;
}

/// Postgres-backed feed log store.
pub struct PgFeedMessageStore {
    pool: PgPool,
}

impl PgFeedMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedMessageStore for PgFeedMessageStore {
    async fn save(&self, entry: &FeedMessage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feed_messages (event_id, message_timestamp, payload, profile_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&entry.event_id)
        .bind(entry.timestamp)
        .bind(&entry.payload)
        .bind(entry.profile_id)
        .execute(&self.pool)
        .await
        .context("Failed to save feed log entry")?;

        Ok(())
    }
}
