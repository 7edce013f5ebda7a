//! Analytics event queueing and batched delivery

pub mod batcher;

pub use batcher::{AnalyticsBatcher, DEFAULT_FLUSH_INTERVAL};
