//! Integration tests for batched analytics delivery
//!
//! These tests drive the flush timer against a mock collector and verify
//! the at-least-once guarantees: failed batches are requeued and retried,
//! overlapping ticks are skipped, and shutdown abandons the queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use shoptrack::{DeviceIdProvider, Tracker, TrackerConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

struct StaticDeviceId(&'static str);

#[async_trait]
impl DeviceIdProvider for StaticDeviceId {
    async fn fetch(&self) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

fn test_tracker(server: &MockServer, flush_interval_ms: u64) -> Tracker {
    let config = TrackerConfig {
        server_url: server.uri(),
        enable_logging: false,
        tracker_enabled: true,
        flush_interval_ms,
    };
    Tracker::with_provider(config, Arc::new(StaticDeviceId("device-1"))).unwrap()
}

/// Bodies of all batches the collector received, in arrival order.
async fn received_batches(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/analytics-events")
        .map(|request: &Request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

fn event_names(batch: &Value) -> Vec<(String, String)> {
    batch["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| {
            (
                event["eventType"].as_str().unwrap().to_string(),
                event["productName"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn queued_events_are_flushed_as_one_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analytics-events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = test_tracker(&server, 100);
    tracker.record_click("T-Shirt").await;
    tracker.record_view("T-Shirt", 1200).await;

    tokio::time::sleep(Duration::from_millis(250)).await;
    tracker.shutdown();

    assert_eq!(tracker.queued_events().await, 0);

    let batches = received_batches(&server).await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0]["adid"], "device-1");
    assert_eq!(
        event_names(&batches[0]),
        vec![
            ("click".to_string(), "T-Shirt".to_string()),
            ("view".to_string(), "T-Shirt".to_string()),
        ]
    );
    assert_eq!(batches[0]["events"][1]["viewDuration"], json!(1200));
}

#[tokio::test]
async fn failed_batch_is_requeued_and_redelivered_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analytics-events"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analytics-events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = test_tracker(&server, 100);
    tracker.record_view("A", 100).await;
    tracker.record_view("B", 200).await;

    tokio::time::sleep(Duration::from_millis(350)).await;
    tracker.shutdown();

    assert_eq!(tracker.queued_events().await, 0);

    let batches = received_batches(&server).await;
    assert_eq!(batches.len(), 2);
    // The retried batch keeps its internal order.
    assert_eq!(
        event_names(&batches[1]),
        vec![
            ("view".to_string(), "A".to_string()),
            ("view".to_string(), "B".to_string()),
        ]
    );
}

#[tokio::test]
async fn retried_events_land_after_ones_recorded_meanwhile() {
    let server = MockServer::start().await;
    // First delivery fails slowly; ticks firing while it is in flight must
    // be skipped, and the failed batch lands behind the event recorded
    // during the outage.
    Mock::given(method("POST"))
        .and(path("/analytics-events"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(500)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analytics-events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = test_tracker(&server, 200);
    tracker.record_view("A", 100).await;
    tracker.record_view("B", 200).await;

    // Recorded while the first flush is still in flight.
    tokio::time::sleep(Duration::from_millis(300)).await;
    tracker.record_view("C", 300).await;

    tokio::time::sleep(Duration::from_millis(900)).await;
    tracker.shutdown();

    assert_eq!(tracker.queued_events().await, 0);

    let batches = received_batches(&server).await;
    // Exactly two deliveries: the slow failure and one retry. The ticks
    // that fired during the 500ms outage performed no delivery.
    assert_eq!(batches.len(), 2);
    assert_eq!(
        event_names(&batches[1]),
        vec![
            ("view".to_string(), "C".to_string()),
            ("view".to_string(), "A".to_string()),
            ("view".to_string(), "B".to_string()),
        ]
    );
}

#[tokio::test]
async fn empty_queue_ticks_send_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analytics-events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tracker = test_tracker(&server, 50);
    tokio::time::sleep(Duration::from_millis(250)).await;
    tracker.shutdown();

    assert!(received_batches(&server).await.is_empty());
}

#[tokio::test]
async fn shutdown_abandons_queued_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analytics-events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tracker = test_tracker(&server, 100);
    tracker.record_view("T-Shirt", 600).await;
    tracker.record_click("T-Shirt").await;
    tracker.shutdown();

    tokio::time::sleep(Duration::from_millis(350)).await;

    // The timer stopped without a final flush; the events stay behind.
    assert_eq!(tracker.queued_events().await, 2);
    assert!(received_batches(&server).await.is_empty());
}
