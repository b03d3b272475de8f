//! Primary-market mapping cache.
//!
//! Answers "is market M a primary market for sport S?" during boost
//! applicability checks. The cache is populated out-of-band (the router
//! service warm-loads it from the `market_mappings` table at boot) and is
//! read-mostly afterwards.

use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

/// Set of `(market_id, sport_urn)` pairs flagged as primary.
#[derive(Debug, Default)]
pub struct MarketMappingCache {
    primary: RwLock<HashSet<String>>,
}

fn mapping_key(market_id: i64, sport_urn: &str) -> String {
    format!("{}|{}", market_id, sport_urn.to_lowercase())
}

impl MarketMappingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            primary: RwLock::new(HashSet::new()),
        }
    }

    /// Flag a market as primary for a sport.
    pub async fn insert(&self, market_id: i64, sport_urn: &str) {
        self.primary
            .write()
            .await
            .insert(mapping_key(market_id, sport_urn));
    }

    /// Bulk-load mappings, e.g. from the relational store at boot.
    pub async fn load(&self, mappings: impl IntoIterator<Item = (i64, String)>) -> usize {
        let mut primary = self.primary.write().await;
        for (market_id, sport_urn) in mappings {
            primary.insert(mapping_key(market_id, &sport_urn));
        }
        debug!("Market mapping cache loaded: {} entries", primary.len());
        primary.len()
    }

    /// True when the market is flagged as primary for the sport.
    pub async fn is_primary_market(&self, market_id: i64, sport_urn: &str) -> bool {
        self.primary
            .read()
            .await
            .contains(&mapping_key(market_id, sport_urn))
    }

    pub async fn len(&self) -> usize {
        self.primary.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.primary.read().await.is_empty()
    }
}
