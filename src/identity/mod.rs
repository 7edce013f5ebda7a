//! One-time device identity resolution
//!
//! The identifier is fetched at most once per process and shared between
//! all callers. Retrieval failure is absorbed into a deterministic
//! fallback identifier, so identity resolution can never block or fail the
//! caller.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Platform capability that yields the device identifier.
#[async_trait]
pub trait DeviceIdProvider: Send + Sync {
    async fn fetch(&self) -> Result<String>;
}

/// Default provider: the `SHOPTRACK_DEVICE_ID` environment variable, then
/// the host machine id.
pub struct HostDeviceId;

#[async_trait]
impl DeviceIdProvider for HostDeviceId {
    async fn fetch(&self) -> Result<String> {
        if let Ok(id) = std::env::var("SHOPTRACK_DEVICE_ID") {
            let id = id.trim();
            if !id.is_empty() {
                return Ok(id.to_string());
            }
        }

        let raw = tokio::fs::read_to_string("/etc/machine-id")
            .await
            .context("failed to read host machine id")?;
        let id = raw.trim();
        if id.is_empty() {
            bail!("host machine id is empty");
        }

        Ok(id.to_string())
    }
}

/// Single-flight cache around a [`DeviceIdProvider`].
///
/// The first `resolve` call starts the underlying fetch; every call,
/// including ones issued while the fetch is still outstanding, awaits the
/// same cell and observes the same value for the rest of the process
/// lifetime. Concurrent callers never trigger a duplicate fetch.
pub struct IdentityResolver {
    provider: Arc<dyn DeviceIdProvider>,
    device_id: OnceCell<String>,
}

impl IdentityResolver {
    pub fn new(provider: Arc<dyn DeviceIdProvider>) -> Self {
        Self {
            provider,
            device_id: OnceCell::new(),
        }
    }

    /// Resolve the device identifier, fetching it on first use.
    pub async fn resolve(&self) -> String {
        self.device_id
            .get_or_init(|| async {
                match self.provider.fetch().await {
                    Ok(id) if !id.is_empty() => {
                        debug!(device_id = %id, "resolved device identifier");
                        id
                    }
                    Ok(_) => {
                        warn!("device identifier provider returned an empty id, using fallback");
                        Self::fallback_id()
                    }
                    Err(err) => {
                        warn!(error = %err, "device identifier retrieval failed, using fallback");
                        Self::fallback_id()
                    }
                }
            })
            .await
            .clone()
    }

    fn fallback_id() -> String {
        format!("fallback-{}", Utc::now().timestamp_millis())
    }
}
