use anyhow::{Context, Result};
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::Serialize;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Statistics for monitoring bus connection health
#[derive(Debug, Default)]
pub struct RedisBusStats {
    /// Total messages published successfully
    pub messages_published: AtomicU64,
    /// Total publish failures
    pub publish_failures: AtomicU64,
    /// Total reconnection attempts
    pub reconnect_attempts: AtomicU64,
}

impl RedisBusStats {
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.messages_published.load(Ordering::Relaxed),
            self.publish_failures.load(Ordering::Relaxed),
            self.reconnect_attempts.load(Ordering::Relaxed),
        )
    }
}

/// Message bus carrying the tenant feed channels.
///
/// ConnectionManager handles reconnection and pooling; a publish that still
/// fails after the internal retries is surfaced to the caller, which treats
/// it as the publication failure for that tenant.
#[derive(Clone)]
pub struct RedisBus {
    client: Client,
    connection: ConnectionManager,
    stats: Arc<RedisBusStats>,
}

impl RedisBus {
    /// Connect using the REDIS_URL environment variable.
    pub async fn new() -> Result<Self> {
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::with_url(&redis_url).await
    }

    /// Connect to an explicit redis URL.
    pub async fn with_url(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;

        let connection = ConnectionManager::new(client.clone())
            .await
            .context("Failed to create Redis ConnectionManager")?;

        info!("Redis ConnectionManager initialized with auto-reconnect");

        Ok(Self {
            client,
            connection,
            stats: Arc::new(RedisBusStats::default()),
        })
    }

    /// Publish a serializable message to a channel.
    pub async fn publish<T: Serialize>(&self, channel: &str, message: &T) -> Result<()> {
        let payload = serde_json::to_string(message)?;
        self.publish_str(channel, &payload).await
    }

    /// Publish a string message to a channel.
    ///
    /// Retries transient failures up to 3 times with exponential backoff.
    pub async fn publish_str(&self, channel: &str, message: &str) -> Result<()> {
        let mut conn = self.connection.clone();

        let mut last_error = None;
        for attempt in 0..3 {
            match conn.publish::<_, _, ()>(channel, message).await {
                Ok(_) => {
                    self.stats.messages_published.fetch_add(1, Ordering::Relaxed);
                    if attempt > 0 {
                        debug!(
                            "Publish succeeded on attempt {} for channel {}",
                            attempt + 1,
                            channel
                        );
                    }
                    return Ok(());
                }
                Err(e) => {
                    self.stats.publish_failures.fetch_add(1, Ordering::Relaxed);
                    last_error = Some(e);

                    if attempt < 2 {
                        let delay = std::time::Duration::from_millis(50 * (1 << attempt));
                        warn!(
                            "Redis publish failed (attempt {}), retrying in {:?}: {}",
                            attempt + 1,
                            delay,
                            last_error.as_ref().unwrap()
                        );
                        self.stats.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Failed to publish to {} after 3 attempts: {}",
            channel,
            last_error.unwrap()
        ))
    }

    /// Subscribe to channels with automatic reconnection.
    ///
    /// Used by the inbound feed listener; the returned wrapper resubscribes
    /// after connection loss.
    pub fn subscribe_with_reconnect(&self, channels: Vec<String>) -> super::ReconnectingPubSub {
        super::ReconnectingPubSub::subscribe(self.client.clone(), channels)
    }

    /// Get connection statistics for monitoring
    pub fn get_stats(&self) -> &RedisBusStats {
        &self.stats
    }

    /// Check if the bus is healthy by sending a PING
    pub async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) => response == "PONG",
            Err(_) => false,
        }
    }
}
