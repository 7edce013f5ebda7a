use serde::{Deserialize, Serialize};

/// A single line item of a completed cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub name: String,

    pub price: f64,

    /// Discount applied to this item, as a fraction in `[0, 1]`.
    pub discount: f64,

    pub final_price: f64,
}

/// A completed checkout, constructed fresh per purchase.
///
/// A purchase is never retried by the tracker: a failed report is surfaced
/// to the caller as `false` and retry policy stays with the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub items: Vec<PurchaseItem>,

    pub total: f64,

    /// When unset, the tracker-level flag is forwarded instead.
    #[serde(default)]
    pub tracker_enabled: Option<bool>,
}
