//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level from config, overridden by `RUST_LOG`

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

use crate::config::ObservabilityConfig;

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(config.json_logs.then(|| fmt::layer().json()))
        .with((!config.json_logs).then(fmt::layer))
        .try_init()
}

fn default_filter(level: &str) -> String {
    format!("rewriting_proxy={level},tower_http={level}")
}
