//! Downstream broker contract and the redis-backed implementation.

pub mod odds_change;

pub use odds_change::OddsChangePublisher;

use crate::models::{Headers, OddsChange};
use crate::redis::RedisBus;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Downstream broker publish contract.
///
/// Implementations are safe to call concurrently. A returned error means the
/// publication for that tenant failed; the router isolates it from the rest
/// of the fan-out.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(
        &self,
        message: &OddsChange,
        sport_id: i64,
        node_id: &str,
        tenant_id: &str,
        headers: &Headers,
    ) -> Result<()>;
}

/// Wire envelope carried on the per-tenant feed channels.
#[derive(Debug, Serialize)]
struct FeedEnvelope<'a> {
    seq: u64,
    timestamp_ms: i64,
    sport_id: i64,
    node_id: &'a str,
    tenant_id: &'a str,
    headers: &'a Headers,
    payload: &'a OddsChange,
}

/// Publishes odds-change messages onto per-tenant redis channels.
///
/// Channel layout: `odds:{tenant_id}:{node_id}:{sport_id}`. Envelopes carry
/// sequence numbers and timestamps for ordering and latency analysis.
pub struct RedisMessagePublisher {
    bus: RedisBus,
    seq: Arc<AtomicU64>,
}

impl RedisMessagePublisher {
    pub fn new(bus: RedisBus) -> Self {
        Self {
            bus,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl MessagePublisher for RedisMessagePublisher {
    async fn publish(
        &self,
        message: &OddsChange,
        sport_id: i64,
        node_id: &str,
        tenant_id: &str,
        headers: &Headers,
    ) -> Result<()> {
        let channel = format!("odds:{}:{}:{}", tenant_id, node_id, sport_id);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        let envelope = FeedEnvelope {
            seq,
            timestamp_ms: Utc::now().timestamp_millis(),
            sport_id,
            node_id,
            tenant_id,
            headers,
            payload: message,
        };

        self.bus.publish(&channel, &envelope).await?;
        debug!(
            "Published odds change {} to {} (seq={})",
            message.event_id, channel, seq
        );
        Ok(())
    }
}
