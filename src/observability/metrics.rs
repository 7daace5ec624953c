//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, branch
//! - `proxy_request_duration_seconds` (histogram): latency by branch
//! - `proxy_rewrites_total` (counter): rewritten references by kind
//!
//! `branch` is one of `html`, `passthrough`, `error`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished proxy request.
pub fn record_request(method: &str, status: u16, branch: &'static str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "branch" => branch
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "branch" => branch)
        .record(start.elapsed().as_secs_f64());
}

/// Record the references rewritten in one HTML document.
pub fn record_rewrites(attributes: usize, css_urls: usize) {
    metrics::counter!("proxy_rewrites_total", "kind" => "attribute").increment(attributes as u64);
    metrics::counter!("proxy_rewrites_total", "kind" => "css_url").increment(css_urls as u64);
}
