//! Transparent rewriting HTTP proxy.
//!
//! `GET /api/proxy?target=<url>` fetches `<url>`, strips the headers that
//! stop it from being framed, and, for HTML, rewrites every `href`, `src`,
//! `action` and CSS `url()` reference so follow-up requests come back
//! through the same endpoint. Everything else is streamed through as-is.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod security;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
