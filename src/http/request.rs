//! Inbound request inspection.
//!
//! # Responsibilities
//! - Note which requests arrived without a request ID of their own
//! - Extract the `target` query parameter
//! - Derive the proxy prefix clients use to re-enter the proxy
//!
//! # Design Decisions
//! - Query decoding follows `application/x-www-form-urlencoded`, the same
//!   rules browsers use for `URLSearchParams`
//! - The first `target` wins; an empty one counts as missing

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Uri};

use crate::error::ProxyError;
use crate::rewrite::ProxyPrefix;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header naming the scheme the client used to reach the edge.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Query parameter holding the URL to fetch.
pub const TARGET_PARAM: &str = "target";

/// Extension set on requests whose `x-request-id` is issued by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedRequestId;

/// Runs before the request ID layer so a generated ID can be told apart
/// from one the client sent.
pub async fn mark_generated_request_id(mut request: Request<Body>) -> Request<Body> {
    if !request.headers().contains_key(X_REQUEST_ID) {
        request.extensions_mut().insert(GeneratedRequestId);
    }
    request
}

/// Request ID of a request, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Decoded, non-empty `target` query parameter.
pub fn target_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == TARGET_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// `{proto}://{host}{mount_path}?target=` for this request.
///
/// `proto` comes from `X-Forwarded-Proto` (else `default_scheme`); `host`
/// from the `Host` header, or the request authority on HTTP/2.
pub fn proxy_prefix(
    headers: &HeaderMap,
    uri: &Uri,
    mount_path: &str,
    default_scheme: &str,
) -> Result<ProxyPrefix, ProxyError> {
    let proto = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(default_scheme);

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .filter(|v| !v.is_empty())
        .ok_or(ProxyError::MissingHost)?;

    Ok(ProxyPrefix::new(proto, host, mount_path))
}
