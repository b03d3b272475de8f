// Shared models for oddsfan Rust services
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Feed Products
// ============================================================================

/// Producer of an odds-change message.
///
/// Boosting only ever applies to prematch traffic; live and virtual messages
/// pass through the router untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Product {
    Prematch,
    Live,
    Virtual,
}

// ============================================================================
// Odds-Change Message
// ============================================================================

/// A single outcome of a market with its current decimal odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub odds: f64,
    pub active: bool,
}

/// A bettable market inside an odds-change message.
///
/// Identity for boost matching is `(id, specifiers)`, see
/// [`OddsChangeMarket::market_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsChangeMarket {
    pub id: i64,
    /// Stable `key=value` pairs joined by `|`, e.g. `"total=2.5"`.
    #[serde(default)]
    pub specifiers: String,
    pub status: i32,
    #[serde(default)]
    pub favourite: bool,
    pub outcomes: Vec<Outcome>,
}

impl OddsChangeMarket {
    /// Join key against the boost catalog: `"{id}|{specifiers}"`.
    ///
    /// Specifiers are normalized so the key is stable regardless of the
    /// order the upstream feed emitted the pairs in.
    pub fn market_key(&self) -> String {
        format!("{}|{}", self.id, normalize_specifiers(&self.specifiers))
    }
}

/// An odds-change message for one fixture.
///
/// Cloning produces a deep copy: all strings and market vectors are owned,
/// so a clone shares no mutable state with the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsChange {
    /// Fixture URN, e.g. `sr:match:12345`.
    pub event_id: String,
    pub product: Product,
    /// Producer timestamp in epoch milliseconds.
    pub timestamp: i64,
    pub markets: Vec<OddsChangeMarket>,
}

/// Sort `key=value` specifier pairs by key so that key construction is
/// deterministic. Pairs are separated by `|`.
pub fn normalize_specifiers(specifiers: &str) -> String {
    if specifiers.is_empty() || !specifiers.contains('|') {
        return specifiers.to_string();
    }
    let mut pairs: Vec<&str> = specifiers.split('|').collect();
    pairs.sort_unstable();
    pairs.join("|")
}

// ============================================================================
// Boost Catalog Rows
// ============================================================================

/// One boosted-market configuration row, scoped to a tenant profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoostedMarketRow {
    pub profile_id: i64,
    pub market_id: i64,
    pub market_specifier: String,
    /// Strategy name resolved through the compiled-in registry,
    /// e.g. `ADDITIVE_PERCENT`.
    pub strategy: String,
    pub percent: f64,
}

impl BoostedMarketRow {
    /// Join key matching [`OddsChangeMarket::market_key`].
    pub fn market_key(&self) -> String {
        format!(
            "{}|{}",
            self.market_id,
            normalize_specifiers(&self.market_specifier)
        )
    }
}

// ============================================================================
// Tenants
// ============================================================================

/// A feed consumer. Tenants without a profile are not routable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub profile_id: Option<i64>,
}

// ============================================================================
// Route Parameters
// ============================================================================

/// Node id used for profile and broadcast publications.
pub const BROADCAST_NODE_ID: &str = "-";

/// Routing instruction for a single publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum RouteParameters {
    /// Fan out to every tenant in the current index snapshot.
    Broadcast,
    /// Fan out to every tenant mapped to the given profile.
    Profile { profile_id: i64 },
    /// Deliver to one tenant on an explicit node.
    Tenant { tenant_id: String, node_id: String },
}

impl RouteParameters {
    pub fn broadcast() -> Self {
        Self::Broadcast
    }

    pub fn profile(profile_id: i64) -> Self {
        Self::Profile { profile_id }
    }

    pub fn tenant(tenant_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self::Tenant {
            tenant_id: tenant_id.into(),
            node_id: node_id.into(),
        }
    }
}

/// Message headers forwarded opaquely to the broker.
pub type Headers = HashMap<String, serde_json::Value>;

// ============================================================================
// Feed Log
// ============================================================================

/// Archived copy of a published message, one row per profile variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMessage {
    pub event_id: String,
    pub timestamp: i64,
    pub payload: String,
    pub profile_id: Option<i64>,
}
