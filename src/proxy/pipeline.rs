//! Fetch-and-gate pipeline.
//!
//! ```text
//! Start → ParamCheck → UrlParse → PrimaryFetch ─┬─ image ──────────→ StreamImage
//!                                               └─ failed/non-image → Fallback ─┬─→ StreamFallback
//!                                                                               └─→ FallbackError
//! ```
//!
//! At most one primary attempt and one gateway attempt per request. With the
//! fallback disabled, the two escalation points surface as 502 and 403.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::proxy::fallback::Fallback;
use crate::proxy::{gate, ProxyError};
use crate::upstream::{browser_headers, HeaderProfile, TargetRef, UpstreamClient};

/// Which hop produced the response handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Primary,
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Primary => "primary",
            Source::Fallback => "fallback",
        }
    }
}

/// An upstream response ready to be streamed to the caller.
#[derive(Debug)]
pub struct Proxied {
    pub source: Source,
    pub upstream: reqwest::Response,
}

/// Per-server pipeline; cheap to clone into handlers.
#[derive(Debug, Clone)]
pub struct ImagePipeline {
    client: Arc<UpstreamClient>,
    profile: HeaderProfile,
    fallback: Option<Fallback>,
    hop_timeout: Duration,
}

impl ImagePipeline {
    pub fn new(config: &ProxyConfig, client: Arc<UpstreamClient>) -> Self {
        let fallback = config
            .fallback
            .enabled
            .then(|| Fallback::new(&config.fallback.gateway_base));

        Self {
            client,
            profile: HeaderProfile {
                user_agent: config.upstream.user_agent.clone(),
                referer_policy: config.upstream.referer_policy,
            },
            fallback,
            hop_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        }
    }

    pub fn client(&self) -> &Arc<UpstreamClient> {
        &self.client
    }

    /// Resolve the `url` parameter into a streamable upstream response.
    ///
    /// Caller errors are returned before any network I/O happens.
    pub async fn fetch(
        &self,
        raw_url: Option<&str>,
        caller_ip: Option<IpAddr>,
    ) -> Result<Proxied, ProxyError> {
        let target = TargetRef::parse(raw_url)?;
        let client = self.client.get().await?;

        let headers = browser_headers(&target, caller_ip, &self.profile);
        let primary = client
            .get(target.url().clone())
            .headers(headers)
            .timeout(self.hop_timeout)
            .send()
            .await;

        let cause = match primary {
            Ok(response) if gate::is_image(response.headers()) => {
                tracing::debug!(
                    url = %target,
                    status = %response.status(),
                    content_type = gate::content_type(response.headers()).unwrap_or_default(),
                    "Primary fetch returned an image"
                );
                return Ok(Proxied {
                    source: Source::Primary,
                    upstream: response,
                });
            }
            Ok(response) => {
                let content_type = gate::content_type(response.headers())
                    .unwrap_or_default()
                    .to_string();
                tracing::info!(
                    url = %target,
                    status = %response.status(),
                    content_type = %content_type,
                    "Primary fetch returned non-image content"
                );
                // Releases the connection before the gateway hop.
                drop(response);
                ProxyError::NonImageContent(content_type)
            }
            Err(e) => {
                tracing::info!(url = %target, error = %e, "Primary fetch failed");
                ProxyError::UpstreamUnreachable(e)
            }
        };

        let Some(fallback) = &self.fallback else {
            return Err(cause);
        };

        crate::observability::metrics::record_fallback(cause.fallback_reason());
        let upstream = fallback
            .fetch(client, target.as_str(), self.hop_timeout)
            .await
            .inspect_err(|e| tracing::warn!(url = %target, error = %e, "Gateway fetch failed"))?;

        Ok(Proxied {
            source: Source::Fallback,
            upstream,
        })
    }
}
