//! Image proxy core.
//!
//! # Data Flow
//! ```text
//! ?url=...
//!     → pipeline.rs (validate, primary fetch with browser headers)
//!     → gate.rs (Content-Type contains "image"?)
//!     → fallback.rs (gateway re-fetch when the primary is unusable)
//!     → Proxied { source, upstream } streamed by the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Stateless per request; the only shared piece is the client pool
//! - One escalation switch governs both failed and non-image primaries
//! - error.rs maps every failure to a status and a plain-text body

pub mod error;
pub mod fallback;
pub mod gate;
pub mod pipeline;

pub use error::ProxyError;
pub use fallback::Fallback;
pub use pipeline::{ImagePipeline, Proxied, Source};
