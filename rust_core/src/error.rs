//! Typed failures of the publish path.
//!
//! Adapter-level plumbing keeps using `anyhow`; these variants exist so that
//! callers of the publisher can tell a malformed route apart from a partial
//! fan-out without parsing strings.

use thiserror::Error;

/// One tenant that did not receive a publication during a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantFailure {
    pub tenant_id: String,
    pub reason: String,
}

impl TenantFailure {
    pub fn new(tenant_id: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors surfaced by [`crate::publisher::OddsChangePublisher::publish`].
#[derive(Debug, Error)]
pub enum PublishError {
    /// The sport URN could not be parsed; nothing was published.
    #[error("malformed sport urn: {urn}")]
    MalformedUrn { urn: String },

    /// A configured boost references a strategy name the registry does not
    /// know. The affected tenant/profile publication fails; on broadcast,
    /// other profiles are unaffected.
    #[error("unknown boost strategy: {name}")]
    UnknownStrategy { name: String },

    /// The boost catalog query itself failed (distinct from an empty result).
    #[error("boost lookup failed: {source}")]
    BoostLookup {
        #[source]
        source: anyhow::Error,
    },

    /// The broker rejected the single-tenant publication.
    #[error("broker publish failed for tenant {tenant_id}: {source}")]
    Broker {
        tenant_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// Fan-out completed but some tenants did not receive the message.
    #[error("publication failed for {} tenant(s)", failed.len())]
    Partial { failed: Vec<TenantFailure> },
}
