//! Tenant→profile index with scheduled refresh.
//!
//! The index holds one immutable snapshot of the mapping. The refresher
//! builds a replacement off the publish path and installs it with a single
//! swap; a publish call captures the snapshot once and derives every routing
//! decision from that capture, so a mid-call refresh never splits a fan-out
//! across two views.

use crate::db::tenants::TenantStore;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Default refresh cadence for the tenant→profile mapping.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(600);

/// One immutable view of the tenant→profile mapping.
pub type IndexSnapshot = Arc<HashMap<String, i64>>;

/// In-memory tenant→profile index.
///
/// Starts empty; until the first successful refresh every publication that
/// needs a tenant drops with a warning.
#[derive(Debug)]
pub struct TenantProfileIndex {
    snapshot: RwLock<IndexSnapshot>,
}

impl TenantProfileIndex {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Capture the current snapshot. Callers hold the returned `Arc` for the
    /// duration of one publish call.
    pub async fn snapshot(&self) -> IndexSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Rebuild the mapping from the tenant store and install it atomically.
    ///
    /// Tenants without a profile are dropped. On store failure the previous
    /// snapshot stays in effect and the error is returned to the caller.
    pub async fn refresh(&self, store: &dyn TenantStore) -> Result<usize> {
        let tenants = store.find_all_tenants().await?;

        let mut mapping = HashMap::new();
        for tenant in tenants {
            if let Some(profile_id) = tenant.profile_id {
                mapping.entry(tenant.id).or_insert(profile_id);
            }
        }

        let count = mapping.len();
        *self.snapshot.write().await = Arc::new(mapping);
        Ok(count)
    }
}

impl Default for TenantProfileIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Tenants mapped to `profile_id` in the given snapshot.
pub fn tenants_by_profile(snapshot: &HashMap<String, i64>, profile_id: i64) -> HashSet<String> {
    snapshot
        .iter()
        .filter(|(_, pid)| **pid == profile_id)
        .map(|(tenant_id, _)| tenant_id.clone())
        .collect()
}

/// Snapshot tenants grouped by their profile.
pub fn group_by_profile(snapshot: &HashMap<String, i64>) -> HashMap<i64, HashSet<String>> {
    let mut grouped: HashMap<i64, HashSet<String>> = HashMap::new();
    for (tenant_id, profile_id) in snapshot {
        grouped
            .entry(*profile_id)
            .or_default()
            .insert(tenant_id.clone());
    }
    grouped
}

/// Start the background refresh loop.
///
/// The first tick fires immediately, so the index warms up as soon as the
/// service starts. The returned handle is aborted on shutdown.
pub fn start_refresh_loop(
    index: Arc<TenantProfileIndex>,
    store: Arc<dyn TenantStore>,
    refresh_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);

        loop {
            interval.tick().await;

            match index.refresh(store.as_ref()).await {
                Ok(count) => {
                    info!("Tenant profile mapping refreshed: {} tenants", count);
                }
                Err(e) => {
                    error!("Failed to refresh tenant profiles mapping: {:#}", e);
                }
            }
        }
    })
}
