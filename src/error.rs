//! Proxy error type and its HTTP rendering.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::ConfigError;

/// Body returned when the `target` query parameter is missing.
pub const MISSING_TARGET_MESSAGE: &str = "?target= クエリパラメータが必要です。";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("missing target query parameter")]
    MissingTarget,

    #[error("invalid target URL: {0}")]
    InvalidTarget(#[from] url::ParseError),

    #[error("request has no Host header")]
    MissingHost,

    #[error("{0}")]
    Upstream(#[source] reqwest::Error),

    #[error("upstream timed out")]
    Timeout,

    #[error("failed to read upstream body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    /// Missing input is the client's fault; everything else is a bad gateway.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Error message followed by each underlying cause.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !detail.contains(&text) {
                detail.push_str(": ");
                detail.push_str(&text);
            }
            source = std::error::Error::source(cause);
        }
        detail
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match self {
            ProxyError::MissingTarget => MISSING_TARGET_MESSAGE.to_string(),
            ref other => format!("Proxy error: {}", other.detail()),
        };
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
