//! Outbound side of the proxy.
//!
//! # Data Flow
//! ```text
//! `url` query parameter
//!     → target.rs (validate absolute http(s) URL)
//!     → headers.rs (browser-like header set)
//!     → client.rs (shared keep-alive pool)
//!     → primary or gateway fetch
//! ```

pub mod client;
pub mod headers;
pub mod target;

pub use client::UpstreamClient;
pub use headers::{browser_headers, HeaderProfile};
pub use target::TargetRef;
