//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, mount path shape and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// Path reserved for the liveness probe.
pub const HEALTH_PATH: &str = "/healthz";

const MAX_REDIRECTS_LIMIT: usize = 100;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }

    let mount_path = config.proxy.mount_path.as_str();
    if !mount_path.starts_with('/') || mount_path == "/" {
        errors.push(ValidationError::new(
            "proxy.mount_path",
            "must start with '/' and name a path below the root",
        ));
    }
    if mount_path.contains(['?', '#', '{', '}', '*', ' ']) {
        errors.push(ValidationError::new(
            "proxy.mount_path",
            "must be a literal path without query, fragment, wildcards or spaces",
        ));
    }
    if mount_path.split('/').any(|segment| segment.starts_with(':')) {
        errors.push(ValidationError::new(
            "proxy.mount_path",
            "segments must not start with ':'",
        ));
    }
    if mount_path == HEALTH_PATH {
        errors.push(ValidationError::new(
            "proxy.mount_path",
            format!("{HEALTH_PATH} is reserved for the health check"),
        ));
    }

    if !matches!(config.proxy.default_scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::new(
            "proxy.default_scheme",
            "must be \"http\" or \"https\"",
        ));
    }

    if config.upstream.max_redirects > MAX_REDIRECTS_LIMIT {
        errors.push(ValidationError::new(
            "upstream.max_redirects",
            format!("must be at most {MAX_REDIRECTS_LIMIT}"),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
