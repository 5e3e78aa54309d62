//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default browser identity presented to upstream hosts.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Root configuration for the image proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound client and header spoofing settings.
    pub upstream: UpstreamConfig,

    /// Image gateway fallback settings.
    pub fallback: FallbackConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// How the `Referer` header is derived from the target hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefererPolicy {
    /// `https://<full hostname>`.
    #[default]
    Hostname,
    /// `https://<last two labels>`, omitted for hostnames of two labels or fewer.
    RegistrableDomain,
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Maximum idle keep-alive connections kept per upstream host.
    pub pool_max_idle_per_host: usize,

    /// Idle connection timeout in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Referer derivation policy.
    pub referer_policy: RefererPolicy,

    /// User-Agent sent on primary fetches.
    pub user_agent: String,

    /// Take the caller IP from inbound X-Forwarded-For / X-Real-IP.
    pub trust_forwarded_headers: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 100,
            pool_idle_timeout_secs: 90,
            referer_policy: RefererPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            trust_forwarded_headers: false,
        }
    }
}

/// Image gateway fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Escalate failed or non-image primary fetches to the gateway.
    /// When disabled those cases answer 502 and 403 respectively.
    pub enabled: bool,

    /// Gateway base URL; requests go to `<base>/unsafe/<url>`.
    pub gateway_base: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gateway_base: "https://thumbor.follow.is".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for each outbound hop (primary and fallback), body included.
    pub upstream_secs: u64,

    /// Deadline for the whole inbound request until response headers.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            request_secs: 65,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.fallback.enabled);
        assert_eq!(config.timeouts.upstream_secs, 30);
        assert_eq!(config.upstream.referer_policy, RefererPolicy::Hostname);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [upstream]
            referer_policy = "registrable_domain"

            [fallback]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.referer_policy, RefererPolicy::RegistrableDomain);
        assert_eq!(config.upstream.pool_max_idle_per_host, 100);
        assert!(!config.fallback.enabled);
        assert_eq!(config.fallback.gateway_base, "https://thumbor.follow.is");
    }
}
