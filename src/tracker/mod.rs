//! The tracker facade wiring all components together

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::debug;

use crate::analytics::AnalyticsBatcher;
use crate::collector::CollectorClient;
use crate::config::{TrackerConfig, TrackerConfigPatch};
use crate::engagement::EngagementCounter;
use crate::identity::{DeviceIdProvider, HostDeviceId, IdentityResolver};
use crate::models::{AnalyticsEvent, PurchaseRecord};
use crate::offer::{OfferCoordinator, OfferListener};
use crate::purchase::PurchaseReporter;

/// Client-side engagement tracker for a storefront surface.
///
/// Owns all tracking state: per-product click counts, the offered set, the
/// analytics queue, and the one-time device identity. Construct one
/// instance at process start and share it by reference with presentation
/// collaborators.
///
/// No tracking call ever returns an error: failures are absorbed into
/// fallback values or boolean results, so callers need no error handling
/// around tracking.
pub struct Tracker {
    config: Arc<RwLock<TrackerConfig>>,
    identity: Arc<IdentityResolver>,
    counter: EngagementCounter,
    offers: OfferCoordinator,
    batcher: AnalyticsBatcher,
    reporter: PurchaseReporter,
}

impl Tracker {
    /// Create a tracker using the default host device-id provider.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        Self::with_provider(config, Arc::new(HostDeviceId))
    }

    /// Create a tracker with a custom device-id provider.
    ///
    /// Must be called from within a tokio runtime: the analytics flush
    /// timer is spawned here.
    pub fn with_provider(
        config: TrackerConfig,
        provider: Arc<dyn DeviceIdProvider>,
    ) -> Result<Self> {
        let flush_interval = Duration::from_millis(config.flush_interval_ms);
        let config = Arc::new(RwLock::new(config));

        let identity = Arc::new(IdentityResolver::new(provider));
        let collector = Arc::new(CollectorClient::new(Arc::clone(&config))?);
        let offers = OfferCoordinator::new(Arc::clone(&collector), Arc::clone(&identity));
        let batcher = AnalyticsBatcher::with_interval(
            Arc::clone(&collector),
            Arc::clone(&identity),
            flush_interval,
        );
        let reporter = PurchaseReporter::new(collector, Arc::clone(&identity), Arc::clone(&config));

        Ok(Self {
            config,
            identity,
            counter: EngagementCounter::new(),
            offers,
            batcher,
            reporter,
        })
    }

    /// Merge the provided fields into the live configuration.
    pub async fn configure(&self, patch: TrackerConfigPatch) {
        let mut config = self.config.write().await;
        config.merge(patch);
        if config.enable_logging {
            debug!(server_url = %config.server_url, "tracker reconfigured");
        }
    }

    /// Record one click on a product.
    ///
    /// Queues a click event for the next analytics batch and, when this
    /// click crosses the offer threshold, runs the coupon workflow before
    /// returning. The registered offer listener is notified exactly once
    /// per crossing, with the collector's coupon or the fallback offer.
    pub async fn record_click(&self, product_name: &str) {
        let outcome = self.counter.record_click(product_name);
        if self.config.read().await.enable_logging {
            debug!(
                product = product_name,
                count = outcome.count,
                "product clicked"
            );
        }

        self.batcher.record(AnalyticsEvent::click(product_name)).await;

        if outcome.crossed_threshold {
            self.offers.on_threshold_crossed(product_name).await;
        }
    }

    /// Record a completed product view. Feeds the analytics batch only.
    pub async fn record_view(&self, product_name: &str, duration_ms: u64) {
        self.batcher
            .record(AnalyticsEvent::view(product_name, duration_ms))
            .await;
    }

    /// Register the offer listener, replacing any previous one.
    pub async fn set_offer_listener(&self, listener: Arc<dyn OfferListener>) {
        self.offers.set_listener(listener).await;
    }

    /// Unregister the offer listener.
    pub async fn clear_offer_listener(&self) {
        self.offers.clear_listener().await;
    }

    /// Report a completed purchase. One delivery attempt, no retry.
    pub async fn report_purchase(&self, purchase: &PurchaseRecord) -> bool {
        self.reporter.report(purchase).await
    }

    /// The device identifier attached to all outbound payloads. Stable for
    /// the process lifetime.
    pub async fn device_id(&self) -> String {
        self.identity.resolve().await
    }

    /// Clear click counts and the offered set, re-arming every product.
    /// The analytics queue is untouched.
    pub fn reset(&self) {
        self.counter.reset();
    }

    /// Current click count for a product.
    pub fn click_count(&self, product_name: &str) -> u32 {
        self.counter.count(product_name)
    }

    /// True once any product has triggered the offer workflow.
    pub fn has_offered_products(&self) -> bool {
        self.counter.has_offered_products()
    }

    /// Set the advisory flag forwarded in purchase payloads. Does not
    /// suppress click or view tracking, or coupon requests.
    pub async fn set_tracker_enabled(&self, enabled: bool) {
        self.config.write().await.tracker_enabled = enabled;
    }

    pub async fn is_tracker_enabled(&self) -> bool {
        self.config.read().await.tracker_enabled
    }

    /// Per-product handle bundling the tracking calls a product tile needs.
    pub fn product(&self, product_name: &str) -> ProductHandle<'_> {
        ProductHandle {
            tracker: self,
            product_name: product_name.to_string(),
        }
    }

    /// Number of analytics events currently awaiting delivery.
    pub async fn queued_events(&self) -> usize {
        self.batcher.queued().await
    }

    /// Stop the analytics flush timer. Events still queued are abandoned.
    pub fn shutdown(&self) {
        self.batcher.shutdown();
    }
}

/// Tracking surface for a single product tile.
pub struct ProductHandle<'a> {
    tracker: &'a Tracker,
    product_name: String,
}

impl ProductHandle<'_> {
    pub async fn click(&self) {
        self.tracker.record_click(&self.product_name).await;
    }

    pub async fn view(&self, duration_ms: u64) {
        self.tracker.record_view(&self.product_name, duration_ms).await;
    }
}
