//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, target extraction, proxy prefix)
//!     → handler.rs (orchestration, error → 400/502)
//!     → client.rs (fetch the target, following redirects)
//!     → response.rs (status, sanitized headers, streamed or rewritten body)
//!     → Send to client
//! ```

pub mod client;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use client::UpstreamClient;
pub use handler::{proxy_handler, AppState};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
