use serde::{Deserialize, Serialize};

/// Discount fraction of the locally synthesized fallback coupon.
pub const FALLBACK_DISCOUNT: f64 = 0.2;

/// A discount coupon for a single product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,

    /// Discount as a fraction in `[0, 1]`.
    pub discount: f64,
}

impl Coupon {
    /// The coupon substituted when the collector cannot be reached or
    /// answers with a non-success status.
    pub fn fallback() -> Self {
        Self {
            id: "fallback".to_string(),
            discount: FALLBACK_DISCOUNT,
        }
    }
}
