//! Inbound odds-change feed subscription
//!
//! Consumes raw odds-change envelopes from the bus and hands them to the
//! publisher. Malformed payloads are logged and skipped; publish failures
//! never stop the listener.

use futures_util::StreamExt;
use oddsfan_rust_core::models::{Headers, OddsChange, RouteParameters};
use oddsfan_rust_core::publisher::OddsChangePublisher;
use oddsfan_rust_core::redis::RedisBus;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Envelope published by the upstream feed ingest.
#[derive(Debug, Deserialize)]
pub struct InboundOddsChange {
    pub message: OddsChange,
    pub sport_urn: String,
    pub route: RouteParameters,
    #[serde(default)]
    pub headers: Headers,
}

/// Consume the inbound channel until the task is aborted.
pub async fn run(bus: RedisBus, channel: String, publisher: Arc<OddsChangePublisher>) {
    let reconnecting_pubsub = bus.subscribe_with_reconnect(vec![channel.clone()]);
    let mut message_stream = reconnecting_pubsub.into_message_stream();

    info!("Odds change listener started on {}", channel);

    while let Some(msg) = message_stream.next().await {
        let payload = msg.get_payload::<String>().unwrap_or_default();
        match serde_json::from_str::<InboundOddsChange>(&payload) {
            Ok(inbound) => {
                if let Err(e) = publisher
                    .publish(
                        &inbound.message,
                        &inbound.sport_urn,
                        inbound.route,
                        &inbound.headers,
                    )
                    .await
                {
                    error!(
                        "Failed to publish odds change {}: {}",
                        inbound.message.event_id, e
                    );
                }
            }
            Err(e) => {
                warn!("Failed to parse inbound odds change: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddsfan_rust_core::models::Product;

    #[test]
    fn test_inbound_envelope_deserializes() {
        let payload = r#"{
            "message": {
                "event_id": "sr:match:12345",
                "product": "PREMATCH",
                "timestamp": 1700000000000,
                "markets": []
            },
            "sport_urn": "sr:sport:1",
            "route": {"route": "broadcast"}
        }"#;

        let inbound: InboundOddsChange = serde_json::from_str(payload).unwrap();
        assert_eq!(inbound.message.event_id, "sr:match:12345");
        assert_eq!(inbound.message.product, Product::Prematch);
        assert_eq!(inbound.route, RouteParameters::broadcast());
        assert!(inbound.headers.is_empty());
    }

    #[test]
    fn test_inbound_envelope_with_tenant_route_and_headers() {
        let payload = r#"{
            "message": {
                "event_id": "sr:match:12345",
                "product": "LIVE",
                "timestamp": 1700000000000,
                "markets": []
            },
            "sport_urn": "sr:sport:1",
            "route": {"route": "tenant", "tenant_id": "t1", "node_id": "node-7"},
            "headers": {"trace-id": "abc"}
        }"#;

        let inbound: InboundOddsChange = serde_json::from_str(payload).unwrap();
        assert_eq!(inbound.route, RouteParameters::tenant("t1", "node-7"));
        assert_eq!(
            inbound.headers.get("trace-id"),
            Some(&serde_json::json!("abc"))
        );
    }
}
