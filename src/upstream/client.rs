//! Shared outbound HTTP client.
//!
//! One keep-alive pool serves every primary and fallback fetch. It is built on
//! first use and then handed out by reference for the life of the process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::config::UpstreamConfig;
use crate::proxy::ProxyError;

/// Lazily initialized connection pool shared by all requests.
///
/// Owned by the server state behind an `Arc`; concurrent first callers of
/// [`UpstreamClient::get`] all observe the same `reqwest::Client`.
#[derive(Debug)]
pub struct UpstreamClient {
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    cell: OnceCell<reqwest::Client>,
    inits: AtomicUsize,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            pool_max_idle_per_host: config.pool_max_idle_per_host,
            pool_idle_timeout: Duration::from_secs(config.pool_idle_timeout_secs),
            cell: OnceCell::new(),
            inits: AtomicUsize::new(0),
        }
    }

    /// Get the pooled client, building it on the first call.
    pub async fn get(&self) -> Result<&reqwest::Client, ProxyError> {
        self.cell
            .get_or_try_init(|| async { self.build() })
            .await
    }

    /// Number of times the pool has been constructed. Never exceeds one.
    pub fn init_count(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    fn build(&self) -> Result<reqwest::Client, ProxyError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(self.pool_idle_timeout)
            // Redirected hops keep the spoofed Referer instead of the previous URL.
            .referer(false)
            .no_proxy()
            .build()
            .map_err(ProxyError::ClientInit)?;

        self.inits.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            pool_max_idle_per_host = self.pool_max_idle_per_host,
            pool_idle_timeout = ?self.pool_idle_timeout,
            "Upstream client pool initialized"
        );
        Ok(client)
    }
}
