//! Caller-supplied target URL.

use std::fmt;

use url::{Host, Url};

use crate::proxy::ProxyError;

/// A validated absolute http(s) URL together with the caller's original text.
///
/// The original text is kept because the gateway fallback embeds it verbatim.
#[derive(Debug, Clone)]
pub struct TargetRef {
    raw: String,
    url: Url,
}

impl TargetRef {
    /// Validate the `url` query parameter.
    ///
    /// Absent or empty input is [`ProxyError::MissingParameter`]; anything that
    /// is not an absolute http(s) URL with a host is [`ProxyError::InvalidUrl`].
    pub fn parse(raw: Option<&str>) -> Result<Self, ProxyError> {
        let raw = match raw {
            Some(s) if !s.is_empty() => s,
            _ => return Err(ProxyError::MissingParameter),
        };

        let url = Url::parse(raw).map_err(|e| ProxyError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ProxyError::InvalidUrl("URL has no host".to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// The text exactly as the caller sent it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hostname without port. IPv6 literals keep their brackets.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// True for `http://10.0.0.1/` and `http://[::1]/` style targets.
    pub fn is_ip_literal(&self) -> bool {
        matches!(self.url.host(), Some(Host::Ipv4(_) | Host::Ipv6(_)))
    }

    /// `host[:port]` of the target.
    ///
    /// The url parser discards a port equal to the scheme default, so
    /// `https://h:443/x` yields `h` even though the caller typed `:443`.
    /// Origin headers therefore never carry a default port.
    pub fn authority(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.hostname(), port),
            None => self.hostname().to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
