use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Kind of interaction captured by an [`AnalyticsEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    View,
}

/// A discrete interaction, immutable once created.
///
/// Serializes directly to the collector's wire shape
/// `{eventType, productName, timestamp, viewDuration?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    #[serde(rename = "eventType")]
    pub kind: EventKind,

    pub product_name: String,

    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// Total time the product was on screen, for view events.
    #[serde(
        rename = "viewDuration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub view_duration_ms: Option<u64>,
}

impl AnalyticsEvent {
    pub fn click(product_name: &str) -> Self {
        Self {
            kind: EventKind::Click,
            product_name: product_name.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            view_duration_ms: None,
        }
    }

    pub fn view(product_name: &str, duration_ms: u64) -> Self {
        Self {
            kind: EventKind::View,
            product_name: product_name.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            view_duration_ms: Some(duration_ms),
        }
    }
}
