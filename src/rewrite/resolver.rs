//! Reference resolution against a page URL.

use url::Url;

/// Schemes whose references are never routed through the proxy.
const PASSTHROUGH_SCHEMES: [&str; 2] = ["data:", "mailto:"];

/// Outcome of resolving a single reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The reference resolved to this absolute URL.
    Absolute(Url),
    /// The reference uses a scheme that must not be rewritten.
    Unchanged,
}

/// A reference that could not be turned into an absolute URL.
#[derive(Debug, thiserror::Error)]
#[error("cannot resolve {candidate:?}: {source}")]
pub struct ResolutionError {
    candidate: String,
    #[source]
    source: url::ParseError,
}

/// Resolve `candidate` against `base`.
///
/// `data:` and `mailto:` references (any case) come back as
/// [`Resolution::Unchanged`]. Everything else follows WHATWG URL parsing,
/// so scheme-relative, path-relative, query-only and fragment references
/// all merge with `base`, and absolute references replace it.
pub fn resolve(base: &Url, candidate: &str) -> Result<Resolution, ResolutionError> {
    if has_passthrough_scheme(candidate) {
        return Ok(Resolution::Unchanged);
    }

    base.join(candidate)
        .map(Resolution::Absolute)
        .map_err(|source| ResolutionError {
            candidate: candidate.to_string(),
            source,
        })
}

fn has_passthrough_scheme(candidate: &str) -> bool {
    PASSTHROUGH_SCHEMES.iter().any(|scheme| {
        candidate
            .get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/dir/page.html?q=1").unwrap()
    }

    fn absolute(candidate: &str) -> String {
        match resolve(&base(), candidate).unwrap() {
            Resolution::Absolute(url) => url.to_string(),
            Resolution::Unchanged => panic!("{candidate} was left unchanged"),
        }
    }

    #[test]
    fn test_root_relative_path() {
        assert_eq!(absolute("/logo.png"), "https://example.com/logo.png");
    }

    #[test]
    fn test_path_relative_merges_with_base_directory() {
        assert_eq!(absolute("img/a.png"), "https://example.com/dir/img/a.png");
        assert_eq!(absolute("../up.css"), "https://example.com/up.css");
    }

    #[test]
    fn test_scheme_relative_takes_base_scheme() {
        assert_eq!(absolute("//cdn.test/x.js"), "https://cdn.test/x.js");
    }

    #[test]
    fn test_absolute_replaces_base() {
        assert_eq!(absolute("http://other.test/a?b=c"), "http://other.test/a?b=c");
    }

    #[test]
    fn test_query_and_fragment_references() {
        assert_eq!(absolute("?page=2"), "https://example.com/dir/page.html?page=2");
        assert_eq!(absolute("#top"), "https://example.com/dir/page.html?q=1#top");
    }

    #[test]
    fn test_data_and_mailto_are_unchanged_in_any_case() {
        for candidate in ["data:image/png;base64,AAA", "mailto:a@b.c", "DATA:x", "MailTo:x"] {
            assert_eq!(resolve(&base(), candidate).unwrap(), Resolution::Unchanged);
        }
    }

    #[test]
    fn test_malformed_reference_is_an_error() {
        let err = resolve(&base(), "http://[::1").unwrap_err();
        assert!(err.to_string().contains("http://[::1"));
    }

    #[test]
    fn test_short_candidate_does_not_panic() {
        assert_eq!(absolute("d"), "https://example.com/dir/d");
    }
}
