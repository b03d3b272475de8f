mod config;
mod listener;

use anyhow::Result;
use dotenv::dotenv;
use oddsfan_rust_core::db::boosts::PgBoostStore;
use oddsfan_rust_core::db::feed_log::PgFeedMessageStore;
use oddsfan_rust_core::db::tenants::{PgTenantStore, TenantStore};
use oddsfan_rust_core::db;
use oddsfan_rust_core::feed_archiver::{FeedArchiver, JsonMessageConverter};
use oddsfan_rust_core::market_mapping::MarketMappingCache;
use oddsfan_rust_core::publisher::{OddsChangePublisher, RedisMessagePublisher};
use oddsfan_rust_core::redis::RedisBus;
use oddsfan_rust_core::tenant_index::{self, TenantProfileIndex};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting OddsRouter Rust Service...");

    let cfg = config::RouterConfig::from_env();
    let pool = db::connect(&config::load_database_url()).await?;
    let bus = RedisBus::with_url(&config::load_redis_url()).await?;

    // Warm the primary-market mapping cache from the relational store
    let market_mappings = Arc::new(MarketMappingCache::new());
    let mappings = db::market_mappings::load_all(&pool).await?;
    let loaded = market_mappings.load(mappings).await;
    info!("Loaded {} primary market mappings", loaded);

    // Tenant index refresh loop; the first tick fires immediately
    let tenant_store: Arc<dyn TenantStore> = Arc::new(PgTenantStore::new(pool.clone()));
    let tenant_index = Arc::new(TenantProfileIndex::new());
    let refresh_task = tenant_index::start_refresh_loop(
        tenant_index.clone(),
        tenant_store,
        cfg.tenant_refresh_interval,
    );

    let archiver = FeedArchiver::new(
        cfg.feed_log_enabled,
        Arc::new(PgFeedMessageStore::new(pool.clone())),
        Arc::new(JsonMessageConverter),
    );

    let publisher = Arc::new(OddsChangePublisher::new(
        Arc::new(RedisMessagePublisher::new(bus.clone())),
        tenant_index,
        Arc::new(PgBoostStore::new(pool)),
        market_mappings,
        archiver,
    ));

    let listener_task = tokio::spawn(listener::run(bus, cfg.feed_channel.clone(), publisher));

    info!(
        "OddsRouter running (feed_log_enabled: {}, refresh_interval: {}s, channel: {})",
        cfg.feed_log_enabled,
        cfg.tenant_refresh_interval.as_secs(),
        cfg.feed_channel
    );

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    refresh_task.abort();
    listener_task.abort();

    Ok(())
}
