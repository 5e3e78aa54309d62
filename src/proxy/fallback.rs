//! Image gateway fallback.
//!
//! # Responsibilities
//! - Build `<gateway>/unsafe/<original url>` from the caller's raw URL
//! - Fetch it with the shared client and the per-hop deadline
//!
//! # Design Decisions
//! - The original URL is embedded as-is, not percent-encoded
//! - No browser headers; the gateway fetches the image itself
//! - No content-type gate on the gateway's answer

use std::time::Duration;

use crate::proxy::ProxyError;

/// Gateway that re-fetches images the primary path could not deliver.
#[derive(Debug, Clone)]
pub struct Fallback {
    base: String,
}

impl Fallback {
    /// Gateway rooted at `gateway_base`; a trailing slash is ignored.
    pub fn new(gateway_base: &str) -> Self {
        Self {
            base: gateway_base.trim_end_matches('/').to_string(),
        }
    }

    /// Gateway address that re-fetches `original`.
    pub fn gateway_url(&self, original: &str) -> String {
        format!("{}/unsafe/{}", self.base, original)
    }

    /// One GET to the gateway. Transport failure is terminal.
    pub async fn fetch(
        &self,
        client: &reqwest::Client,
        original: &str,
        timeout: Duration,
    ) -> Result<reqwest::Response, ProxyError> {
        let url = self.gateway_url(original);
        tracing::debug!(gateway_url = %url, "Fetching through image gateway");

        client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(ProxyError::FallbackUnreachable)
    }
}
