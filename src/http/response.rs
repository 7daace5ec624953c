//! Outbound response assembly.
//!
//! # Responsibilities
//! - Carry the upstream status (and a non-standard reason phrase) through
//! - Apply sanitized upstream headers
//! - Stream passthrough bodies; send rewritten HTML as UTF-8
//!
//! # Design Decisions
//! - Framing headers are dropped: the re-served body is framed by this
//!   server, and rewriting changes its length anyway
//! - Passthrough bodies are never buffered

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use hyper::ext::ReasonPhrase;

use crate::security::headers::{retain, sanitize};

/// Headers describing the upstream hop rather than the body we send.
const FRAMING_HEADERS: [&str; 4] = ["content-length", "transfer-encoding", "connection", "keep-alive"];

/// Status line and sanitized headers of an upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamHead {
    pub status: StatusCode,
    pub reason: Option<ReasonPhrase>,
    pub headers: HeaderMap,
}

impl UpstreamHead {
    pub fn from_response(upstream: &reqwest::Response) -> Self {
        Self {
            status: upstream.status(),
            reason: upstream.extensions().get::<ReasonPhrase>().cloned(),
            headers: sanitize(upstream.headers().clone()),
        }
    }

    /// Whether any `Content-Type` value mentions `text/html`.
    pub fn is_html(&self) -> bool {
        self.headers
            .get_all(header::CONTENT_TYPE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|ct| ct.contains("text/html"))
    }
}

/// Re-serve an upstream body untouched.
pub fn passthrough(head: UpstreamHead, upstream: reqwest::Response) -> Response {
    build(head, Body::from_stream(upstream.bytes_stream()))
}

/// Serve rewritten HTML. The text is always sent as UTF-8.
pub fn rewritten(mut head: UpstreamHead, html: String) -> Response {
    if let Some(content_type) = utf8_content_type(&head.headers) {
        head.headers.insert(header::CONTENT_TYPE, content_type);
    }
    build(head, Body::from(html))
}

fn build(head: UpstreamHead, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = head.status;
    *response.headers_mut() = retain(head.headers, |name| !FRAMING_HEADERS.contains(&name.as_str()));
    if let Some(reason) = head.reason {
        response.extensions_mut().insert(reason);
    }
    response
}

/// Replacement `Content-Type` when the upstream declared a non-UTF-8 charset.
fn utf8_content_type(headers: &HeaderMap) -> Option<HeaderValue> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mut params = value.split(';').map(str::trim);
    let essence = params.next()?;

    let foreign_charset = params.any(|param| {
        let Some((name, charset)) = param.split_once('=') else {
            return false;
        };
        name.trim().eq_ignore_ascii_case("charset")
            && !charset.trim().trim_matches('"').eq_ignore_ascii_case("utf-8")
    });

    if foreign_charset {
        HeaderValue::from_str(&format!("{essence}; charset=utf-8")).ok()
    } else {
        None
    }
}
