//! Data models shared across the tracking components

pub mod coupon;
pub mod event;
pub mod purchase;

pub use coupon::{Coupon, FALLBACK_DISCOUNT};
pub use event::{AnalyticsEvent, EventKind};
pub use purchase::{PurchaseItem, PurchaseRecord};
