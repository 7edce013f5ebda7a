//! Purchase reporting

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::collector::CollectorClient;
use crate::config::TrackerConfig;
use crate::identity::IdentityResolver;
use crate::models::PurchaseRecord;

/// Reports completed carts to the collector.
pub struct PurchaseReporter {
    collector: Arc<CollectorClient>,
    identity: Arc<IdentityResolver>,
    config: Arc<RwLock<TrackerConfig>>,
}

impl PurchaseReporter {
    pub fn new(
        collector: Arc<CollectorClient>,
        identity: Arc<IdentityResolver>,
        config: Arc<RwLock<TrackerConfig>>,
    ) -> Self {
        Self {
            collector,
            identity,
            config,
        }
    }

    /// Deliver one purchase record.
    ///
    /// Returns `true` only on a success status. Any transport error or
    /// non-success status yields `false` and the record is not retried;
    /// retry policy belongs to the caller.
    pub async fn report(&self, purchase: &PurchaseRecord) -> bool {
        let adid = self.identity.resolve().await;
        let tracker_enabled = match purchase.tracker_enabled {
            Some(enabled) => enabled,
            None => self.config.read().await.tracker_enabled,
        };

        match self
            .collector
            .send_purchase(&adid, &purchase.items, purchase.total, tracker_enabled)
            .await
        {
            Ok(()) => {
                debug!(
                    total = purchase.total,
                    items = purchase.items.len(),
                    "purchase reported"
                );
                true
            }
            Err(err) => {
                warn!(error = %err, "purchase report failed");
                false
            }
        }
    }
}
