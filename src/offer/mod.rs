//! One-time offer workflow for products that crossed the click threshold

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::collector::CollectorClient;
use crate::identity::IdentityResolver;
use crate::models::Coupon;

/// Receives the outcome of the offer workflow for a product.
///
/// Exactly one notification arrives per threshold crossing, whether the
/// coupon request succeeded or fell back, so presentation code can rely on
/// "crossing implies eventual notification".
pub trait OfferListener: Send + Sync {
    fn on_offer_received(&self, product_name: &str, discount: f64, coupon_id: &str);
}

/// Listener installed while no subscriber is registered. Keeps the
/// notification path branch-free.
struct NoopOfferListener;

impl OfferListener for NoopOfferListener {
    fn on_offer_received(&self, _product_name: &str, _discount: f64, _coupon_id: &str) {}
}

/// Issues the coupon request for threshold crossings and notifies the
/// single registered listener.
pub struct OfferCoordinator {
    collector: Arc<CollectorClient>,
    identity: Arc<IdentityResolver>,
    listener: RwLock<Arc<dyn OfferListener>>,
}

impl OfferCoordinator {
    pub fn new(collector: Arc<CollectorClient>, identity: Arc<IdentityResolver>) -> Self {
        Self {
            collector,
            identity,
            listener: RwLock::new(Arc::new(NoopOfferListener)),
        }
    }

    /// Replace the registered listener. The slot is single-subscriber: any
    /// previous listener is dropped silently.
    pub async fn set_listener(&self, listener: Arc<dyn OfferListener>) {
        *self.listener.write().await = listener;
    }

    /// Unregister by reinstalling the no-op listener.
    pub async fn clear_listener(&self) {
        *self.listener.write().await = Arc::new(NoopOfferListener);
    }

    /// Run the coupon request for one crossing and notify the listener,
    /// substituting the fallback offer on any failure.
    pub async fn on_threshold_crossed(&self, product_name: &str) {
        let adid = self.identity.resolve().await;

        let coupon = match self.collector.request_coupon(&adid, product_name).await {
            Ok(coupon) => coupon,
            Err(err) => {
                warn!(
                    product = product_name,
                    error = %err,
                    "coupon request failed, using fallback offer"
                );
                Coupon::fallback()
            }
        };

        debug!(
            product = product_name,
            coupon_id = %coupon.id,
            discount = coupon.discount,
            "notifying offer listener"
        );
        let listener = self.listener.read().await.clone();
        listener.on_offer_received(product_name, coupon.discount, &coupon.id);
    }
}
