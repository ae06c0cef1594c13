//! Authenticated, throttled polling of a Stretch gateway.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::StretchConfig;
use crate::error::{AppError, Result};
use crate::minirest::{self, APPLIANCES_PATH};
use crate::snapshot::Snapshot;
use crate::throttle::Throttle;

/// The gateway only accepts this fixed user name.
pub const STRETCH_USERNAME: &str = "stretch";

pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(30);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Per-request timeout, covering connect and body.
    pub timeout: Duration,
    /// Minimum gap between two real gateway calls.
    pub throttle: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            throttle: DEFAULT_THROTTLE,
        }
    }
}

impl From<&StretchConfig> for BridgeOptions {
    fn from(cfg: &StretchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.timeout_secs),
            throttle: Duration::from_secs(cfg.throttle_secs),
        }
    }
}

// Timestamp and snapshot sit behind one lock so they always change together.
#[derive(Debug)]
struct BridgeState {
    throttle: Throttle,
    snapshot: Option<Arc<Snapshot>>,
}

/// Owns the connection to one gateway and the latest appliance snapshot.
///
/// Share it between sensors with an `Arc`. Fetches serialize on an internal
/// lock held across the request, so concurrent callers inside one throttle
/// window trigger a single network call.
#[derive(Debug)]
pub struct Bridge {
    client: Client,
    url: String,
    authorization: HeaderValue,
    state: Mutex<BridgeState>,
}

impl Bridge {
    pub fn new(host: &str, password: &str) -> Result<Self> {
        Self::with_options(host, password, BridgeOptions::default())
    }

    /// Build the endpoint and credentials. Nothing is sent until [`Bridge::fetch`].
    pub fn with_options(host: &str, password: &str, options: BridgeOptions) -> Result<Self> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(AppError::Config("gateway host cannot be empty".to_string()));
        }

        let credentials = STANDARD.encode(format!("{STRETCH_USERNAME}:{password}"));
        let mut authorization = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| AppError::Config(format!("invalid authorization header: {e}")))?;
        authorization.set_sensitive(true);

        // The gateway sits on the local network; system proxies never apply.
        let client = Client::builder()
            .timeout(options.timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            url: format!("http://{host}{APPLIANCES_PATH}"),
            authorization,
            state: Mutex::new(BridgeState {
                throttle: Throttle::new(options.throttle),
                snapshot: None,
            }),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Poll the gateway unless the last call is still inside the throttle window.
    ///
    /// Returns the snapshot held after the call. A throttled call returns the
    /// stored snapshot untouched; a failed call leaves it untouched too.
    pub async fn fetch(&self) -> Result<Option<Arc<Snapshot>>> {
        let mut state = self.state.lock().await;

        let now = Instant::now();
        if !state.throttle.ready(now) {
            debug!(
                url = %self.url,
                interval_secs = state.throttle.interval().as_secs(),
                "fetch throttled; keeping stored snapshot"
            );
            return Ok(state.snapshot.clone());
        }
        state.throttle.mark(now);

        let snapshot = Arc::new(self.request_snapshot().await?);
        info!(
            appliances = snapshot.len(),
            captured_at = %snapshot.captured_at.to_rfc3339(),
            "stored new appliance snapshot"
        );
        state.snapshot = Some(Arc::clone(&snapshot));
        Ok(Some(snapshot))
    }

    async fn request_snapshot(&self) -> Result<Snapshot> {
        debug!(url = %self.url, "requesting appliance listing");
        let response = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, self.authorization.clone())
            .send()
            .await?;

        let status = response.status();
        debug!(url = %self.url, status = %status, "gateway responded");
        if !status.is_success() {
            return Err(AppError::HttpStatus(status));
        }

        let body = response.bytes().await?;
        let xml = std::str::from_utf8(&body)
            .map_err(|e| AppError::Parse(format!("response body is not valid UTF-8: {e}")))?;

        Ok(Snapshot::new(minirest::parse_appliances(xml)?))
    }

    /// Latest stored snapshot, `None` until a fetch has succeeded.
    pub async fn data(&self) -> Option<Arc<Snapshot>> {
        self.state.lock().await.snapshot.clone()
    }

    /// Current power of one appliance in the latest snapshot.
    pub async fn lookup(&self, id: &str) -> Result<f64> {
        let state = self.state.lock().await;
        let snapshot = state.snapshot.as_ref().ok_or(AppError::NoSnapshot)?;
        snapshot
            .get(id)
            .map(|appliance| appliance.current_power)
            .ok_or_else(|| AppError::UnknownAppliance(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_appliances_url_from_host() {
        let bridge = Bridge::new("192.168.1.20", "secret").unwrap();
        assert_eq!(bridge.url(), "http://192.168.1.20/minirest/appliances/");

        let bridge = Bridge::new(" stretch.local:8080/ ", "secret").unwrap();
        assert_eq!(bridge.url(), "http://stretch.local:8080/minirest/appliances/");
    }

    #[test]
    fn encodes_basic_credentials_with_fixed_user() {
        let bridge = Bridge::new("stretch.local", "abc123").unwrap();
        assert_eq!(
            bridge.authorization.to_str().unwrap(),
            "Basic c3RyZXRjaDphYmMxMjM="
        );
        assert!(bridge.authorization.is_sensitive());
    }

    #[test]
    fn rejects_empty_host() {
        let err = Bridge::new("  ", "secret").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn lookup_without_snapshot_reports_no_snapshot() {
        let bridge = Bridge::new("stretch.local", "secret").unwrap();
        assert!(bridge.data().await.is_none());
        assert!(matches!(
            bridge.lookup("123").await,
            Err(AppError::NoSnapshot)
        ));
    }
}
