//! Client-side engagement tracking for storefront surfaces.
//!
//! The crate observes per-product interactions, triggers a one-time offer
//! workflow once a product crosses the click threshold, and forwards
//! analytics events and purchase records to a remote collector despite
//! transient network failure. All state lives in memory inside an explicit
//! [`Tracker`] instance; nothing survives process restart.

pub mod analytics;
pub mod collector;
pub mod config;
pub mod engagement;
pub mod identity;
pub mod models;
pub mod offer;
pub mod purchase;
pub mod tracker;

pub use analytics::AnalyticsBatcher;
pub use collector::{CollectorClient, CollectorError};
pub use config::{TrackerConfig, TrackerConfigPatch};
pub use engagement::{ClickOutcome, EngagementCounter, CLICK_THRESHOLD};
pub use identity::{DeviceIdProvider, HostDeviceId, IdentityResolver};
pub use models::{AnalyticsEvent, Coupon, EventKind, PurchaseItem, PurchaseRecord};
pub use offer::{OfferCoordinator, OfferListener};
pub use purchase::PurchaseReporter;
pub use tracker::{ProductHandle, Tracker};

/// Crate version, attached to outbound requests via the user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
