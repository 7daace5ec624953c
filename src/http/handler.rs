//! Proxy request handler.
//!
//! ```text
//! ParseTarget ─▶ Dispatch ─▶ Branch ─┬─ html ────────▶ buffer, rewrite ─▶ Respond
//!      │             │               └─ passthrough ─▶ stream ──────────▶ Respond
//!      └─────────────┴──▶ ErrorResponse (400 missing target, 502 otherwise)
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::MountConfig;
use crate::error::ProxyError;
use crate::http::client::UpstreamClient;
use crate::http::request::{self, GeneratedRequestId, X_REQUEST_ID};
use crate::http::response::{self, UpstreamHead};
use crate::observability::metrics;
use crate::rewrite::ContentRewriter;
use crate::security::headers::retain;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: UpstreamClient,
    pub rewriter: Arc<ContentRewriter>,
    pub mount: Arc<MountConfig>,
    /// Limit on the upstream exchange; `None` waits as long as the origin does.
    pub request_timeout: Option<Duration>,
}

/// Which way a request left the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Html,
    Passthrough,
    Error,
}

impl Branch {
    pub fn as_str(self) -> &'static str {
        match self {
            Branch::Html => "html",
            Branch::Passthrough => "passthrough",
            Branch::Error => "error",
        }
    }
}

/// Fetch `?target=` and return it, rewritten when it is HTML.
///
/// Always produces a response: failures become 400 or 502 here.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request::request_id(request.headers()).to_string();

    let outcome = match state.request_timeout {
        Some(limit) => tokio::time::timeout(limit, forward(&state, request))
            .await
            .unwrap_or(Err(ProxyError::Timeout)),
        None => forward(&state, request).await,
    };

    match outcome {
        Ok((response, branch)) => {
            metrics::record_request(&method, response.status().as_u16(), branch.as_str(), start_time);
            response
        }
        Err(error) => {
            let status = error.status();
            if status == StatusCode::BAD_REQUEST {
                tracing::debug!(request_id = %request_id, "Request without target rejected");
            } else {
                tracing::warn!(request_id = %request_id, error = %error.detail(), "Proxy error");
            }
            metrics::record_request(&method, status.as_u16(), Branch::Error.as_str(), start_time);
            error.into_response()
        }
    }
}

async fn forward(state: &AppState, request: Request<Body>) -> Result<(Response, Branch), ProxyError> {
    let target = request::target_param(request.uri()).ok_or(ProxyError::MissingTarget)?;
    let target = Url::parse(&target)?;

    let (parts, body) = request.into_parts();
    tracing::debug!(method = %parts.method, target = %target, "Proxying request");

    // An ID this proxy made up is not part of what the client sent.
    let inbound = if parts.extensions.get::<GeneratedRequestId>().is_some() {
        retain(parts.headers.clone(), |name| name.as_str() != X_REQUEST_ID)
    } else {
        parts.headers.clone()
    };

    let upstream = state
        .client
        .dispatch(parts.method.clone(), &target, &inbound, body)
        .await?;
    let head = UpstreamHead::from_response(&upstream);

    tracing::debug!(
        status = %head.status,
        final_url = %upstream.url(),
        html = head.is_html(),
        "Upstream responded"
    );

    if !head.is_html() {
        return Ok((response::passthrough(head, upstream), Branch::Passthrough));
    }

    let prefix = request::proxy_prefix(
        &parts.headers,
        &parts.uri,
        &state.mount.mount_path,
        &state.mount.default_scheme,
    )?;
    let html = upstream.text().await.map_err(ProxyError::Body)?;
    let rewritten = state.rewriter.rewrite(&html, &target, &prefix);

    tracing::debug!(
        attributes = rewritten.attributes,
        css_urls = rewritten.css_urls,
        "Rewrote document"
    );
    metrics::record_rewrites(rewritten.attributes, rewritten.css_urls);

    Ok((response::rewritten(head, rewritten.text), Branch::Html))
}
