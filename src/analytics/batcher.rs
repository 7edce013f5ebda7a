//! Event queue with periodic batched delivery to the collector
//!
//! Delivery is at-least-once while the batcher runs: a failed batch is
//! appended back onto the queue and retried on a later tick, so retried
//! events may be delivered after events recorded in the meantime. Events
//! still queued at shutdown are abandoned, not flushed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time;
use tracing::{debug, info, warn};

use crate::collector::CollectorClient;
use crate::identity::IdentityResolver;
use crate::models::AnalyticsEvent;

/// Default period of the flush timer.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

struct BatcherShared {
    queue: Mutex<Vec<AnalyticsEvent>>,
    in_flight: AtomicBool,
    collector: Arc<CollectorClient>,
    identity: Arc<IdentityResolver>,
}

impl BatcherShared {
    /// One delivery attempt: swap the queue out as the in-flight batch,
    /// send it, and append the whole batch back onto whatever accumulated
    /// meanwhile if the collector rejects it.
    async fn flush_once(&self) {
        let batch = {
            let mut queue = self.queue.lock().await;
            if queue.is_empty() {
                return;
            }
            std::mem::take(&mut *queue)
        };

        let adid = self.identity.resolve().await;
        match self.collector.send_events(&adid, &batch).await {
            Ok(()) => {
                debug!(count = batch.len(), "delivered analytics batch");
            }
            Err(err) => {
                warn!(
                    error = %err,
                    count = batch.len(),
                    "analytics delivery failed, requeueing batch"
                );
                self.queue.lock().await.extend(batch);
            }
        }
    }
}

/// Queues analytics events and flushes them on a fixed interval.
///
/// At most one flush is outstanding at any time; a timer tick that fires
/// while a flush is still in flight is skipped, not queued.
pub struct AnalyticsBatcher {
    shared: Arc<BatcherShared>,
    shutdown_tx: watch::Sender<bool>,
}

impl AnalyticsBatcher {
    /// Create a batcher flushing every [`DEFAULT_FLUSH_INTERVAL`].
    pub fn new(collector: Arc<CollectorClient>, identity: Arc<IdentityResolver>) -> Self {
        Self::with_interval(collector, identity, DEFAULT_FLUSH_INTERVAL)
    }

    /// Create a batcher with a custom flush period and start its timer
    /// task. Must be called from within a tokio runtime.
    pub fn with_interval(
        collector: Arc<CollectorClient>,
        identity: Arc<IdentityResolver>,
        flush_interval: Duration,
    ) -> Self {
        let shared = Arc::new(BatcherShared {
            queue: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            collector,
            identity,
        });
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            let mut interval = time::interval(flush_interval);

            // Skip the first tick which fires immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if task_shared.in_flight.swap(true, Ordering::SeqCst) {
                            debug!("analytics flush still in flight, skipping tick");
                            continue;
                        }

                        let flush_shared = Arc::clone(&task_shared);
                        tokio::spawn(async move {
                            flush_shared.flush_once().await;
                            flush_shared.in_flight.store(false, Ordering::SeqCst);
                        });
                    }
                    changed = shutdown_rx.changed() => {
                        // A dropped sender stops the timer just like an
                        // explicit shutdown.
                        if changed.is_err() || *shutdown_rx.borrow() {
                            let abandoned = task_shared.queue.lock().await.len();
                            if abandoned > 0 {
                                info!(
                                    count = abandoned,
                                    "analytics batcher stopped, abandoning queued events"
                                );
                            } else {
                                info!("analytics batcher stopped");
                            }
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shared,
            shutdown_tx,
        }
    }

    /// Append an event to the queue. Returns without any network I/O.
    pub async fn record(&self, event: AnalyticsEvent) {
        self.shared.queue.lock().await.push(event);
    }

    /// Number of events currently awaiting delivery.
    pub async fn queued(&self) -> usize {
        self.shared.queue.lock().await.len()
    }

    /// Stop the flush timer. Events still queued are abandoned.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use tokio::sync::RwLock;

    fn test_batcher(flush_interval: Duration) -> AnalyticsBatcher {
        let config = Arc::new(RwLock::new(TrackerConfig {
            // Nothing is listening here; these tests never reach the wire.
            server_url: "http://127.0.0.1:9".to_string(),
            ..TrackerConfig::default()
        }));
        let collector = Arc::new(CollectorClient::new(config).unwrap());
        let identity = Arc::new(IdentityResolver::new(Arc::new(crate::identity::HostDeviceId)));
        AnalyticsBatcher::with_interval(collector, identity, flush_interval)
    }

    #[tokio::test]
    async fn record_appends_without_flushing() {
        let batcher = test_batcher(Duration::from_secs(3600));

        batcher.record(AnalyticsEvent::click("T-Shirt")).await;
        batcher.record(AnalyticsEvent::view("T-Shirt", 800)).await;

        assert_eq!(batcher.queued().await, 2);
    }

    #[tokio::test]
    async fn shutdown_leaves_queued_events_in_place() {
        let batcher = test_batcher(Duration::from_millis(20));

        batcher.shutdown();
        batcher.record(AnalyticsEvent::click("Jeans")).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(batcher.queued().await, 1);
    }
}
