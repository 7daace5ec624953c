//! Response header sanitization.
//!
//! # Responsibilities
//! - Strip headers that stop the mirrored page from being framed or
//!   embedded cross-origin
//! - Leave every other header (order and repeated values included) alone
//!
//! # Design Decisions
//! - Names are matched through `HeaderName`, which is always lowercase, so
//!   the upstream's casing never matters
//! - Filtering rebuilds the map: `HeaderMap::remove` would reorder entries

use axum::http::{HeaderMap, HeaderName};

/// Headers removed from every upstream response.
pub const EMBEDDING_BLOCKERS: [&str; 3] = [
    "content-security-policy",
    "x-frame-options",
    "cross-origin-embedder-policy",
];

/// Drop the embedding-blocking headers from an upstream response.
pub fn sanitize(headers: HeaderMap) -> HeaderMap {
    retain(headers, |name| !EMBEDDING_BLOCKERS.contains(&name.as_str()))
}

/// Keep only the entries whose name satisfies `keep`, preserving order.
pub fn retain(headers: HeaderMap, keep: impl Fn(&HeaderName) -> bool) -> HeaderMap {
    let mut kept = HeaderMap::with_capacity(headers.len());
    let mut current: Option<HeaderName> = None;

    // `None` names continue the previous entry's name.
    for (name, value) in headers {
        if let Some(name) = name {
            current = Some(name);
        }
        if let Some(name) = current.as_ref().filter(|name| keep(name)) {
            kept.append(name.clone(), value);
        }
    }
    kept
}
