use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Runtime configuration for a [`Tracker`](crate::tracker::Tracker).
///
/// Immutable after construction except through
/// [`merge`](TrackerConfig::merge), which is driven by the tracker's
/// `configure` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the remote collector.
    pub server_url: String,

    /// Gates the chattiest per-interaction debug logging. Warnings and
    /// errors are always emitted.
    #[serde(default)]
    pub enable_logging: bool,

    /// Advisory flag forwarded in purchase payloads. Toggling it does not
    /// suppress tracking calls.
    #[serde(default = "TrackerConfig::default_tracker_enabled")]
    pub tracker_enabled: bool,

    /// Period of the analytics flush timer in milliseconds. Read once when
    /// the batcher starts; later changes have no effect.
    #[serde(default = "TrackerConfig::default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

/// Partial configuration merged into a live [`TrackerConfig`].
///
/// Only the fields that are live-updatable appear here; the flush interval
/// is fixed once the batcher timer has started.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerConfigPatch {
    pub server_url: Option<String>,
    pub enable_logging: Option<bool>,
    pub tracker_enabled: Option<bool>,
}

impl TrackerConfig {
    const fn default_tracker_enabled() -> bool {
        true
    }

    const fn default_flush_interval_ms() -> u64 {
        5_000
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let server_url = std::env::var("SHOPTRACK_SERVER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let enable_logging = std::env::var("SHOPTRACK_ENABLE_LOGGING")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let tracker_enabled = std::env::var("SHOPTRACK_TRACKER_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or_else(|_| Self::default_tracker_enabled());

        let flush_interval_ms = std::env::var("SHOPTRACK_FLUSH_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(Self::default_flush_interval_ms);

        Ok(TrackerConfig {
            server_url,
            enable_logging,
            tracker_enabled,
            flush_interval_ms,
        })
    }

    /// Merge the provided fields, leaving unset fields untouched.
    pub fn merge(&mut self, patch: TrackerConfigPatch) {
        if let Some(server_url) = patch.server_url {
            self.server_url = server_url;
        }
        if let Some(enable_logging) = patch.enable_logging {
            self.enable_logging = enable_logging;
        }
        if let Some(tracker_enabled) = patch.tracker_enabled {
            self.tracker_enabled = tracker_enabled;
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            enable_logging: false,
            tracker_enabled: Self::default_tracker_enabled(),
            flush_interval_ms: Self::default_flush_interval_ms(),
        }
    }
}
