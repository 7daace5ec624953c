//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream response headers:
//!     → headers.rs (strip framing/embedding restrictions)
//!     → Response assembly
//! ```

pub mod headers;

pub use headers::{sanitize, EMBEDDING_BLOCKERS};
