//! HTTP client for the remote collector endpoints
//!
//! All three endpoints are JSON over POST with camelCase field names. The
//! base URL is read from the shared config on every call so reconfiguration
//! takes effect immediately.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::models::{AnalyticsEvent, Coupon, PurchaseItem};

/// Failure of a single collector request.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("collector returned status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type CollectorResult<T> = Result<T, CollectorError>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CouponRequest<'a> {
    adid: &'a str,
    product_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CouponResponse {
    coupon_id: String,
    discount: f64,
}

#[derive(Serialize)]
struct EventBatch<'a> {
    adid: &'a str,
    events: &'a [AnalyticsEvent],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PurchasePayload<'a> {
    adid: &'a str,
    items: &'a [PurchaseItem],
    total: f64,
    tracker_enabled: bool,
}

/// Thin client around the collector's coupon, purchase, and analytics
/// endpoints.
pub struct CollectorClient {
    http: Client,
    config: Arc<RwLock<TrackerConfig>>,
}

impl CollectorClient {
    pub fn new(config: Arc<RwLock<TrackerConfig>>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("shoptrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client for the collector")?;

        Ok(Self { http, config })
    }

    async fn endpoint(&self, path: &str) -> String {
        let base = self.config.read().await.server_url.clone();
        format!("{}/{}", base.trim_end_matches('/'), path)
    }

    /// Request a coupon for a product that crossed the click threshold.
    pub async fn request_coupon(&self, adid: &str, product_name: &str) -> CollectorResult<Coupon> {
        let url = self.endpoint("coupon").await;
        let response = self
            .http
            .post(&url)
            .json(&CouponRequest { adid, product_name })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CollectorError::Status(response.status()));
        }

        let coupon: CouponResponse = response.json().await?;
        debug!(
            coupon_id = %coupon.coupon_id,
            discount = coupon.discount,
            product = product_name,
            "coupon received"
        );

        Ok(Coupon {
            id: coupon.coupon_id,
            discount: coupon.discount,
        })
    }

    /// Deliver one batch of analytics events. The response body is ignored
    /// beyond its status.
    pub async fn send_events(&self, adid: &str, events: &[AnalyticsEvent]) -> CollectorResult<()> {
        let url = self.endpoint("analytics-events").await;
        let response = self
            .http
            .post(&url)
            .json(&EventBatch { adid, events })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CollectorError::Status(response.status()));
        }

        Ok(())
    }

    /// Report a completed purchase. Exactly one attempt per call.
    pub async fn send_purchase(
        &self,
        adid: &str,
        items: &[PurchaseItem],
        total: f64,
        tracker_enabled: bool,
    ) -> CollectorResult<()> {
        let url = self.endpoint("purchase").await;
        let response = self
            .http
            .post(&url)
            .json(&PurchasePayload {
                adid,
                items,
                total,
                tracker_enabled,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CollectorError::Status(response.status()));
        }

        Ok(())
    }
}
