//! Upstream fetch dispatch.
//!
//! # Responsibilities
//! - Forward the inbound method, headers and body to the target URL
//! - Follow redirects so callers only ever see the final response
//! - Surface any failure immediately; nothing is retried
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` per server; it holds no per-request state
//! - Headers describing the inbound connection are not re-sent: the new
//!   connection has its own `Host`, framing and encoding negotiation
//! - Response bodies are decoded (gzip/brotli/deflate) like a fetch runtime

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use reqwest::redirect::Policy;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::security::headers::retain;

/// Inbound headers that are never forwarded upstream.
const CONNECTION_HEADERS: [&str; 11] = [
    "host",
    "content-length",
    "transfer-encoding",
    "connection",
    "keep-alive",
    "upgrade",
    "te",
    "trailer",
    "proxy-connection",
    "proxy-authorization",
    "accept-encoding",
];

/// Client used to fetch target URLs.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: reqwest::Client,
    user_agent: Option<HeaderValue>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder().redirect(Policy::limited(config.max_redirects));
        if config.connect_timeout_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        }
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let inner = builder.build().map_err(ProxyError::Client)?;

        let user_agent = Some(config.user_agent.as_str())
            .filter(|ua| !ua.is_empty())
            .and_then(|ua| HeaderValue::from_str(ua).ok());

        Ok(Self { inner, user_agent })
    }

    /// Fetch `target` with the inbound method, headers and body.
    ///
    /// The body is streamed upstream for every method except GET and HEAD.
    pub async fn dispatch(
        &self,
        method: Method,
        target: &Url,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<reqwest::Response, ProxyError> {
        let forwarded = self.forwarded_headers(headers);
        let sends_body = method != Method::GET && method != Method::HEAD;

        let mut request = self
            .inner
            .request(method, target.clone())
            .headers(forwarded);
        if sends_body {
            request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        request.send().await.map_err(ProxyError::Upstream)
    }

    fn forwarded_headers(&self, headers: &HeaderMap) -> HeaderMap {
        let mut forwarded = retain(headers.clone(), |name| !CONNECTION_HEADERS.contains(&name.as_str()));
        if let Some(ua) = &self.user_agent {
            forwarded.entry(header::USER_AGENT).or_insert_with(|| ua.clone());
        }
        forwarded
    }
}
