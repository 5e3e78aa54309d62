//! Image-fetching reverse proxy.
//!
//! `GET /?url=<image url>` fetches the image with browser-like headers and
//! streams it back. Failed or non-image fetches are retried once through an
//! image gateway (`<gateway>/unsafe/<url>`).
//!
//! ```text
//!   caller ──▶ http::server ──▶ proxy::pipeline ──▶ upstream (browser headers)
//!                                    │    │
//!                                    │    └── not an image / unreachable
//!                                    │                  │
//!                                    │                  ▼
//!                                    │           proxy::fallback ──▶ gateway
//!                                    ▼
//!   caller ◀── http::response (status + Content-Type + streamed body)
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
