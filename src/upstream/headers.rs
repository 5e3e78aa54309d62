//! Browser-like request headers for primary fetches.
//!
//! # Responsibilities
//! - Make the outbound fetch look like a browser loading an `<img>`
//! - Derive Referer and Origin from the target so hotlink checks pass
//! - Forward the caller IP in X-Forwarded-For
//!
//! # Design Decisions
//! - Pure function of (target, caller IP, policy); no client state involved
//! - Values that are not valid header values are skipped rather than failing the request

use std::net::IpAddr;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::RefererPolicy;
use crate::upstream::target::TargetRef;

pub const ACCEPT_IMAGE: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Settings that shape the spoofed header set.
#[derive(Debug, Clone)]
pub struct HeaderProfile {
    pub user_agent: String,
    pub referer_policy: RefererPolicy,
}

/// Build the header set for a primary fetch of `target` on behalf of `caller_ip`.
pub fn browser_headers(
    target: &TargetRef,
    caller_ip: Option<IpAddr>,
    profile: &HeaderProfile,
) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(14);

    if let Some(host) = referer_host(target, profile.referer_policy) {
        insert(&mut headers, "referer", &format!("https://{}", host));
    }
    insert(&mut headers, "user-agent", &profile.user_agent);
    if let Some(ip) = caller_ip {
        insert(&mut headers, "x-forwarded-for", &ip.to_string());
    }

    insert(&mut headers, "accept", ACCEPT_IMAGE);
    insert(&mut headers, "accept-language", ACCEPT_LANGUAGE);
    insert(&mut headers, "cache-control", "no-cache");
    insert(&mut headers, "pragma", "no-cache");
    insert(&mut headers, "sec-fetch-dest", "image");
    insert(&mut headers, "sec-fetch-mode", "no-cors");
    insert(&mut headers, "sec-fetch-site", "cross-site");
    insert(
        &mut headers,
        "origin",
        &format!("{}://{}", target.scheme(), target.authority()),
    );
    insert(&mut headers, "dnt", "1");
    insert(&mut headers, "connection", "keep-alive");

    headers
}

/// Host used in the Referer header, or `None` when the header is omitted.
///
/// The registrable-domain reduction keeps the last two labels, which is wrong
/// for multi-part public suffixes such as `co.uk`. IP literals are never
/// reduced.
pub fn referer_host(target: &TargetRef, policy: RefererPolicy) -> Option<&str> {
    let hostname = target.hostname();
    match policy {
        RefererPolicy::Hostname => Some(hostname),
        RefererPolicy::RegistrableDomain if target.is_ip_literal() => Some(hostname),
        RefererPolicy::RegistrableDomain => {
            let labels = hostname.split('.').count();
            if labels <= 2 {
                return None;
            }
            hostname
                .rmatch_indices('.')
                .nth(1)
                .map(|(idx, _)| &hostname[idx + 1..])
        }
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(HeaderName::from_static(name), v);
        }
        Err(_) => tracing::debug!(header = name, value, "Skipping unencodable header value"),
    }
}
