//! Best-effort archival of published messages to the feed log.
//!
//! Archival never blocks or fails a publication: the store write runs on its
//! own task and every error is logged and swallowed.

use crate::db::feed_log::FeedMessageStore;
use crate::models::{FeedMessage, OddsChange};
use anyhow::Result;
use std::sync::Arc;
use tracing::error;

/// Serializes an odds-change message into its archived payload form.
///
/// The canonical feed payload encoding lives behind this seam; the default
/// converter emits JSON.
pub trait MessageConverter: Send + Sync {
    fn write_as_string(&self, message: &OddsChange) -> Result<String>;
}

/// JSON payload converter.
pub struct JsonMessageConverter;

impl MessageConverter for JsonMessageConverter {
    fn write_as_string(&self, message: &OddsChange) -> Result<String> {
        Ok(serde_json::to_string(message)?)
    }
}

/// Fire-and-forget feed log writer.
pub struct FeedArchiver {
    enabled: bool,
    store: Arc<dyn FeedMessageStore>,
    converter: Arc<dyn MessageConverter>,
}

impl FeedArchiver {
    pub fn new(
        enabled: bool,
        store: Arc<dyn FeedMessageStore>,
        converter: Arc<dyn MessageConverter>,
    ) -> Self {
        Self {
            enabled,
            store,
            converter,
        }
    }

    /// Archive one published message variant.
    ///
    /// `profile_id` is `None` for raw broadcasts. When archival is disabled
    /// this is a no-op and the converter is never invoked. The store write is
    /// spawned and not awaited; ordering across archive writes is not
    /// guaranteed.
    pub fn archive(&self, profile_id: Option<i64>, message: &OddsChange) {
        if !self.enabled {
            return;
        }

        let payload = match self.converter.write_as_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Error serializing message for feed log: {:#}", e);
                return;
            }
        };

        let entry = FeedMessage {
            event_id: message.event_id.clone(),
            timestamp: message.timestamp,
            payload,
            profile_id,
        };

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.save(&entry).await {
                error!("Error saving feed log entry: {:#}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingFeedStore {
        saved: Mutex<Vec<FeedMessage>>,
    }

    impl RecordingFeedStore {
        fn new() -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
            }
        }

        fn saved(&self) -> Vec<FeedMessage> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedMessageStore for RecordingFeedStore {
        async fn save(&self, entry: &FeedMessage) -> Result<()> {
            self.saved.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    struct FailingFeedStore;

    #[async_trait]
    impl FeedMessageStore for FailingFeedStore {
        async fn save(&self, _entry: &FeedMessage) -> Result<()> {
            Err(anyhow!("document store unavailable"))
        }
    }

    struct PanickingConverter;

    impl MessageConverter for PanickingConverter {
        fn write_as_string(&self, _message: &OddsChange) -> Result<String> {
            panic!("converter must not be touched when archival is disabled");
        }
    }

    fn message() -> OddsChange {
        OddsChange {
            event_id: "sr:match:12345".to_string(),
            product: Product::Prematch,
            timestamp: 1_700_000_000_000,
            markets: vec![],
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_archive_writes_entry() {
        let store = Arc::new(RecordingFeedStore::new());
        let archiver = FeedArchiver::new(true, store.clone(), Arc::new(JsonMessageConverter));

        archiver.archive(Some(7), &message());

        wait_for(|| !store.saved().is_empty()).await;
        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].event_id, "sr:match:12345");
        assert_eq!(saved[0].timestamp, 1_700_000_000_000);
        assert_eq!(saved[0].profile_id, Some(7));
        assert!(saved[0].payload.contains("\"PREMATCH\""));
    }

    #[tokio::test]
    async fn test_disabled_archiver_touches_nothing() {
        let store = Arc::new(RecordingFeedStore::new());
        let archiver = FeedArchiver::new(false, store.clone(), Arc::new(PanickingConverter));

        archiver.archive(None, &message());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.saved().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let archiver = FeedArchiver::new(
            true,
            Arc::new(FailingFeedStore),
            Arc::new(JsonMessageConverter),
        );

        // must not panic or surface anything
        archiver.archive(None, &message());
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
