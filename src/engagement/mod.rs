//! Per-product click counting and threshold detection

use dashmap::{DashMap, DashSet};

/// Number of clicks on a product that triggers the offer workflow.
pub const CLICK_THRESHOLD: u32 = 3;

/// Result of recording a single click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOutcome {
    /// Updated click count for the product.
    pub count: u32,

    /// True exactly once per product: when the count first reaches
    /// [`CLICK_THRESHOLD`] and the product has not already been offered.
    pub crossed_threshold: bool,
}

/// In-memory per-product engagement state.
///
/// Counts only grow; the offered set records which products have already
/// triggered a coupon request. Both are cleared together by `reset`.
#[derive(Default)]
pub struct EngagementCounter {
    counts: DashMap<String, u32>,
    offered: DashSet<String>,
}

impl EngagementCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one click and report whether it crossed the offer threshold.
    ///
    /// A crossing marks the product as offered before this method returns,
    /// so a second click racing ahead of the coupon round trip can never
    /// observe a second crossing for the same product.
    pub fn record_click(&self, product: &str) -> ClickOutcome {
        let count = {
            let mut entry = self.counts.entry(product.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        let crossed_threshold = count == CLICK_THRESHOLD && self.offered.insert(product.to_string());

        ClickOutcome {
            count,
            crossed_threshold,
        }
    }

    /// Current click count for a product.
    pub fn count(&self, product: &str) -> u32 {
        self.counts
            .get(product)
            .map(|entry| *entry.value())
            .unwrap_or(0)
    }

    /// True once any product has triggered the offer workflow.
    pub fn has_offered_products(&self) -> bool {
        !self.offered.is_empty()
    }

    /// Clear all counts and the offered set, re-arming every product.
    pub fn reset(&self) {
        self.counts.clear();
        self.offered.clear();
    }
}
