//! Odds-change routing: single-tenant, per-profile, and broadcast fan-out
//! with boost resolution.

use crate::boost;
use crate::boost::applicator::boost_map_of;
use crate::db::boosts::BoostStore;
use crate::error::{PublishError, TenantFailure};
use crate::feed_archiver::FeedArchiver;
use crate::market_mapping::MarketMappingCache;
use crate::models::{
    BoostedMarketRow, Headers, OddsChange, Product, RouteParameters, BROADCAST_NODE_ID,
};
use crate::publisher::MessagePublisher;
use crate::tenant_index::{group_by_profile, tenants_by_profile, IndexSnapshot, TenantProfileIndex};
use crate::urn::Urn;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Top-level publish entry point for odds-change messages.
///
/// Holds handles to the broker, the tenant→profile index, the boost catalog,
/// the market mapping cache and the feed archiver; everything is injected at
/// construction.
pub struct OddsChangePublisher {
    broker: Arc<dyn MessagePublisher>,
    tenant_index: Arc<TenantProfileIndex>,
    boost_store: Arc<dyn BoostStore>,
    market_mappings: Arc<MarketMappingCache>,
    archiver: FeedArchiver,
}

impl OddsChangePublisher {
    pub fn new(
        broker: Arc<dyn MessagePublisher>,
        tenant_index: Arc<TenantProfileIndex>,
        boost_store: Arc<dyn BoostStore>,
        market_mappings: Arc<MarketMappingCache>,
        archiver: FeedArchiver,
    ) -> Self {
        Self {
            broker,
            tenant_index,
            boost_store,
            market_mappings,
            archiver,
        }
    }

    /// Route one odds-change message.
    ///
    /// The index snapshot is captured once here; every routing decision of
    /// this call derives from that capture, so a concurrent refresh never
    /// splits a fan-out across two views of the tenant set.
    pub async fn publish(
        &self,
        message: &OddsChange,
        sport_urn: &str,
        route: RouteParameters,
        headers: &Headers,
    ) -> Result<(), PublishError> {
        let sport_id = Urn::parse(sport_urn)
            .map_err(|_| PublishError::MalformedUrn {
                urn: sport_urn.to_string(),
            })?
            .id;

        let snapshot = self.tenant_index.snapshot().await;

        match route {
            RouteParameters::Tenant { tenant_id, node_id } => {
                self.publish_to_single_tenant(
                    message, sport_urn, sport_id, &snapshot, tenant_id, node_id, headers,
                )
                .await
            }
            RouteParameters::Profile { profile_id } => {
                self.publish_to_profile(message, sport_urn, sport_id, &snapshot, profile_id, headers)
                    .await
            }
            RouteParameters::Broadcast => {
                self.broadcast_to_all(message, sport_urn, sport_id, &snapshot, headers)
                    .await
            }
        }
    }

    /// Convenience overload for callers without headers.
    pub async fn publish_no_headers(
        &self,
        message: &OddsChange,
        sport_urn: &str,
        route: RouteParameters,
    ) -> Result<(), PublishError> {
        self.publish(message, sport_urn, route, &Headers::new()).await
    }

    async fn publish_to_single_tenant(
        &self,
        message: &OddsChange,
        sport_urn: &str,
        sport_id: i64,
        snapshot: &IndexSnapshot,
        tenant_id: String,
        node_id: String,
        headers: &Headers,
    ) -> Result<(), PublishError> {
        let Some(profile_id) = snapshot.get(&tenant_id).copied() else {
            warn!(
                "Tenant {} not found in active index. Skipping publication.",
                tenant_id
            );
            return Ok(());
        };

        let boosted = self.resolve_boosted(message, sport_urn, profile_id).await?;
        let outgoing = boosted.as_ref().unwrap_or(message);

        self.broker
            .publish(outgoing, sport_id, &node_id, &tenant_id, headers)
            .await
            .map_err(|source| PublishError::Broker { tenant_id, source })
    }

    async fn publish_to_profile(
        &self,
        message: &OddsChange,
        sport_urn: &str,
        sport_id: i64,
        snapshot: &IndexSnapshot,
        profile_id: i64,
        headers: &Headers,
    ) -> Result<(), PublishError> {
        let boosted = self.resolve_boosted(message, sport_urn, profile_id).await?;
        let outgoing = boosted.as_ref().unwrap_or(message);

        let mut failed = Vec::new();
        for tenant_id in tenants_by_profile(snapshot, profile_id) {
            if let Err(e) = self
                .broker
                .publish(outgoing, sport_id, BROADCAST_NODE_ID, &tenant_id, headers)
                .await
            {
                error!("Broker publish failed for tenant {}: {:#}", tenant_id, e);
                failed.push(TenantFailure::new(tenant_id, format!("{:#}", e)));
            }
        }

        self.archiver.archive(Some(profile_id), outgoing);
        finish(failed)
    }

    async fn broadcast_to_all(
        &self,
        message: &OddsChange,
        sport_urn: &str,
        sport_id: i64,
        snapshot: &IndexSnapshot,
        headers: &Headers,
    ) -> Result<(), PublishError> {
        if !self.is_boost_applicable(message, sport_urn).await {
            return self
                .publish_raw_to_all(message, sport_id, snapshot, headers)
                .await;
        }

        let all_boosts = self
            .boost_store
            .find_by_fixtures(&[message.event_id.clone()])
            .await
            .map_err(|source| PublishError::BoostLookup { source })?;

        if all_boosts.is_empty() {
            return self
                .publish_raw_to_all(message, sport_id, snapshot, headers)
                .await;
        }

        let profile_boosts = group_boosts_by_profile(&all_boosts);
        let grouped_tenants = group_by_profile(snapshot);

        let mut failed = Vec::new();
        for (profile_id, tenants) in &grouped_tenants {
            let boosted = match profile_boosts.get(profile_id) {
                Some(boost_map) => match boost::apply(message, boost_map) {
                    Ok(boosted) => Some(boosted),
                    Err(e) => {
                        error!(
                            "Boost apply failed for profile {}, skipping its tenants: {:#}",
                            profile_id, e
                        );
                        for tenant_id in tenants {
                            failed.push(TenantFailure::new(tenant_id.clone(), &e));
                        }
                        continue;
                    }
                },
                None => None,
            };
            let outgoing = boosted.as_ref().unwrap_or(message);

            for tenant_id in tenants {
                if let Err(e) = self
                    .broker
                    .publish(outgoing, sport_id, BROADCAST_NODE_ID, tenant_id, headers)
                    .await
                {
                    error!("Broker publish failed for tenant {}: {:#}", tenant_id, e);
                    failed.push(TenantFailure::new(tenant_id.clone(), format!("{:#}", e)));
                }
            }

            self.archiver.archive(Some(*profile_id), outgoing);
        }

        finish(failed)
    }

    async fn publish_raw_to_all(
        &self,
        message: &OddsChange,
        sport_id: i64,
        snapshot: &IndexSnapshot,
        headers: &Headers,
    ) -> Result<(), PublishError> {
        let mut failed = Vec::new();
        for tenant_id in snapshot.keys() {
            if let Err(e) = self
                .broker
                .publish(message, sport_id, BROADCAST_NODE_ID, tenant_id, headers)
                .await
            {
                error!("Broker publish failed for tenant {}: {:#}", tenant_id, e);
                failed.push(TenantFailure::new(tenant_id.clone(), format!("{:#}", e)));
            }
        }

        self.archiver.archive(None, message);
        finish(failed)
    }

    /// Boosted copy of the message for one profile, or `None` when the
    /// message passes through unchanged.
    async fn resolve_boosted(
        &self,
        message: &OddsChange,
        sport_urn: &str,
        profile_id: i64,
    ) -> Result<Option<OddsChange>, PublishError> {
        if !self.is_boost_applicable(message, sport_urn).await {
            return Ok(None);
        }

        let boosts = self
            .boost_store
            .find_by_profile_and_fixture(profile_id, &message.event_id)
            .await
            .map_err(|source| PublishError::BoostLookup { source })?;

        if boosts.is_empty() {
            return Ok(None);
        }

        let boost_map = boost_map_of(&boosts);
        Ok(Some(boost::apply(message, &boost_map)?))
    }

    /// Boosting applies only to prematch messages carrying at least one
    /// primary market for the sport.
    async fn is_boost_applicable(&self, message: &OddsChange, sport_urn: &str) -> bool {
        if message.product != Product::Prematch {
            return false;
        }
        for market in &message.markets {
            if self
                .market_mappings
                .is_primary_market(market.id, sport_urn)
                .await
            {
                return true;
            }
        }
        false
    }
}

/// Group catalog rows into per-profile boost maps, first-seen wins per key.
fn group_boosts_by_profile(
    boosts: &[BoostedMarketRow],
) -> HashMap<i64, HashMap<String, BoostedMarketRow>> {
    let mut grouped: HashMap<i64, HashMap<String, BoostedMarketRow>> = HashMap::new();
    for row in boosts {
        grouped
            .entry(row.profile_id)
            .or_default()
            .entry(row.market_key())
            .or_insert_with(|| row.clone());
    }
    grouped
}

fn finish(failed: Vec<TenantFailure>) -> Result<(), PublishError> {
    if failed.is_empty() {
        Ok(())
    } else {
        Err(PublishError::Partial { failed })
    }
}
