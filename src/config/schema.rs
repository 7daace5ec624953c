//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the rewriting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where the proxy is mounted and how it names itself.
    pub proxy: MountConfig,

    /// Outbound fetch settings.
    pub upstream: UpstreamConfig,

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

/// Mount point of the proxy endpoint.
///
/// Rewritten links point back at `{proto}://{host}{mount_path}?target=`, so
/// this must match the path clients actually reach the proxy on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MountConfig {
    /// Path of the proxy endpoint.
    pub mount_path: String,

    /// Scheme used in rewritten links when `X-Forwarded-Proto` is absent.
    pub default_scheme: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            mount_path: "/api/proxy".to_string(),
            default_scheme: "http".to_string(),
        }
    }
}

/// Upstream (origin) fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in seconds (0 = none).
    pub connect_timeout_secs: u64,

    /// Maximum redirects followed before giving up.
    pub max_redirects: usize,

    /// User-Agent sent when the client did not send one (empty = none).
    pub user_agent: String,

    /// Honour HTTP(S)_PROXY environment variables for outbound requests.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            max_redirects: 20,
            user_agent: String::new(),
            use_system_proxy: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for the upstream exchange, in seconds (0 = none).
    ///
    /// Covers the fetch and, for HTML, buffering the whole body. Expiry is
    /// reported like any other upstream failure.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 0 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
