//! HTML/CSS reference rewriting.
//!
//! Two passes run over the text, attribute references first and then CSS
//! `url()` references, each substituting the proxy form of every reference
//! it can resolve and copying everything else through untouched.

use regex::{Captures, Regex};
use url::Url;

use crate::rewrite::encoder::{encode, ProxyPrefix};
use crate::rewrite::resolver::{resolve, Resolution};

/// `href="..."`, `src='...'`, `action="..."`. The closing quote must match
/// the opening one and the value may contain neither quote character.
const ATTRIBUTE_PATTERN: &str = r#"(href|src|action)=(?:"([^"']+)"|'([^"']+)')"#;

/// `url(...)` with an optional matching quote around the body.
const CSS_URL_PATTERN: &str = r#"url\((?:"([^)"']+)"|'([^)"']+)'|([^)"']+))\)"#;

/// Bodies starting with this are never matched by the CSS pass.
const INLINE_DATA: &str = "data:";

/// Result of one rewrite over a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    /// References rewritten by the attribute pass.
    pub attributes: usize,
    /// References rewritten by the CSS `url()` pass.
    pub css_urls: usize,
}

/// Compiled rewrite patterns. Immutable, shared by every request.
#[derive(Debug, Clone)]
pub struct ContentRewriter {
    attribute: Regex,
    css_url: Regex,
}

impl ContentRewriter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            attribute: Regex::new(ATTRIBUTE_PATTERN)?,
            css_url: Regex::new(CSS_URL_PATTERN)?,
        })
    }

    /// Rewrite every resolvable reference in `html` to go through `prefix`.
    ///
    /// `base` is the URL the document was fetched from. References that are
    /// `data:`/`mailto:`, fail to resolve, or already point into the proxy are
    /// left exactly as found.
    pub fn rewrite(&self, html: &str, base: &Url, prefix: &ProxyPrefix) -> Rewritten {
        let (text, attributes) = self.rewrite_attributes(html, base, prefix);
        let (text, css_urls) = self.rewrite_css_urls(&text, base, prefix);
        Rewritten {
            text,
            attributes,
            css_urls,
        }
    }

    fn rewrite_attributes(&self, html: &str, base: &Url, prefix: &ProxyPrefix) -> (String, usize) {
        let mut rewritten = 0;
        let text = self.attribute.replace_all(html, |caps: &Captures<'_>| {
            let (quote, value) = match (caps.get(2), caps.get(3)) {
                (Some(value), _) => ('"', value.as_str()),
                (None, Some(value)) => ('\'', value.as_str()),
                (None, None) => return caps[0].to_string(),
            };
            match proxied(base, prefix, value) {
                Some(link) => {
                    rewritten += 1;
                    format!("{}={quote}{link}{quote}", &caps[1])
                }
                None => caps[0].to_string(),
            }
        });
        (text.into_owned(), rewritten)
    }

    fn rewrite_css_urls(&self, text: &str, base: &Url, prefix: &ProxyPrefix) -> (String, usize) {
        let mut out = String::with_capacity(text.len());
        let mut rewritten = 0;
        let mut copied = 0;
        let mut search_from = 0;

        while let Some(caps) = self.css_url.captures_at(text, search_from) {
            let Some(whole) = caps.get(0) else { break };
            let (quote, body) = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(body), _, _) => ("\"", body.as_str()),
                (None, Some(body), _) => ("'", body.as_str()),
                (None, None, Some(body)) => ("", body.as_str()),
                (None, None, None) => break,
            };

            if body.starts_with(INLINE_DATA) {
                // Not a match here; a later `url(` inside the body still can be.
                search_from = whole.start() + 1;
                continue;
            }

            out.push_str(&text[copied..whole.start()]);
            match proxied(base, prefix, body) {
                Some(link) => {
                    rewritten += 1;
                    out.push_str("url(");
                    out.push_str(quote);
                    out.push_str(&link);
                    out.push_str(quote);
                    out.push(')');
                }
                None => out.push_str(whole.as_str()),
            }
            copied = whole.end();
            search_from = whole.end();
        }

        out.push_str(&text[copied..]);
        (out, rewritten)
    }
}

/// Proxy form of `reference`, or `None` when it must stay as written.
fn proxied(base: &Url, prefix: &ProxyPrefix, reference: &str) -> Option<String> {
    match resolve(base, reference) {
        Ok(Resolution::Absolute(url)) if url.as_str().starts_with(prefix.as_str()) => None,
        Ok(Resolution::Absolute(url)) => Some(encode(prefix, &url)),
        Ok(Resolution::Unchanged) => None,
        Err(error) => {
            tracing::trace!(%error, "leaving reference unchanged");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::percent_decode_str;

    const PREFIX: &str = "http://myproxy.example/api/proxy?target=";

    fn prefix() -> ProxyPrefix {
        ProxyPrefix::new("http", "myproxy.example", "/api/proxy")
    }

    fn rewrite(html: &str, base: &str) -> Rewritten {
        ContentRewriter::new()
            .unwrap()
            .rewrite(html, &Url::parse(base).unwrap(), &prefix())
    }

    #[test]
    fn test_img_src_is_proxied() {
        let out = rewrite(r#"<img src="/logo.png">"#, "https://example.com/page");
        assert_eq!(
            out.text,
            r#"<img src="http://myproxy.example/api/proxy?target=https%3A%2F%2Fexample.com%2Flogo.png">"#
        );
        assert_eq!(out.attributes, 1);
        assert_eq!(out.css_urls, 0);
    }

    #[test]
    fn test_css_url_is_proxied() {
        let out = rewrite("body { background: url(bg.jpg) }", "https://site.test/assets/style.css");
        assert_eq!(
            out.text,
            "body { background: url(http://myproxy.example/api/proxy?target=https%3A%2F%2Fsite.test%2Fassets%2Fbg.jpg) }"
        );
        assert_eq!(out.css_urls, 1);
    }

    #[test]
    fn test_quote_style_is_preserved() {
        let out = rewrite(
            r#"<a href='a.html'></a><form action="/go"></form><style>i{x:url("i.png")} b{x:url('b.png')}</style>"#,
            "https://site.test/",
        );
        assert!(out.text.contains(&format!("href='{PREFIX}https%3A%2F%2Fsite.test%2Fa.html'")));
        assert!(out.text.contains(&format!(r#"action="{PREFIX}https%3A%2F%2Fsite.test%2Fgo""#)));
        assert!(out.text.contains(&format!(r#"url("{PREFIX}https%3A%2F%2Fsite.test%2Fi.png")"#)));
        assert!(out.text.contains(&format!("url('{PREFIX}https%3A%2F%2Fsite.test%2Fb.png')")));
        assert_eq!((out.attributes, out.css_urls), (2, 2));
    }

    #[test]
    fn test_data_and_mailto_attributes_are_untouched() {
        let html = r#"<img src="data:image/png;base64,AAAA"><a href="mailto:me@site.test">m</a><a href='MAILTO:x@y.z'>"#;
        let out = rewrite(html, "https://site.test/");
        assert_eq!(out.text, html);
        assert_eq!(out.attributes, 0);
    }

    #[test]
    fn test_css_data_url_is_untouched() {
        let css = "a{background:url(data:image/gif;base64,R0lGOD)} b{background:url('data:x')}";
        let out = rewrite(css, "https://site.test/");
        assert_eq!(out.text, css);
    }

    #[test]
    fn test_css_scan_resumes_inside_skipped_data_url() {
        let out = rewrite("url(data:url(x))", "https://site.test/");
        assert_eq!(out.text, format!("url(data:url({PREFIX}https%3A%2F%2Fsite.test%2Fx))"));
    }

    #[test]
    fn test_mismatched_quotes_are_not_candidates() {
        let html = r#"<a href="it's">x</a><img src='a"b'>"#;
        assert_eq!(rewrite(html, "https://site.test/").text, html);
    }

    #[test]
    fn test_unlisted_and_uppercase_attributes_are_ignored() {
        let html = r#"<img srcset="a.png 2x" HREF="/x" style="color:red">"#;
        assert_eq!(rewrite(html, "https://site.test/").text, html);
    }

    #[test]
    fn test_unresolvable_reference_is_left_verbatim() {
        let html = r#"<a href="http://[::1">bad</a><a href="/ok">ok</a>"#;
        let out = rewrite(html, "https://site.test/");
        assert!(out.text.starts_with(r#"<a href="http://[::1">bad</a>"#));
        assert!(out.text.contains(&format!(r#"href="{PREFIX}https%3A%2F%2Fsite.test%2Fok""#)));
        assert_eq!(out.attributes, 1);
    }

    #[test]
    fn test_text_outside_references_is_byte_identical() {
        let html = "<p>caf\u{e9} \u{2603} href = \"x\" url() </p>";
        assert_eq!(rewrite(html, "https://site.test/").text, html);
    }

    #[test]
    fn test_css_url_decodes_back_to_resolved_reference() {
        let out = rewrite("x{a:url(../img/p.png?v=2)}", "https://site.test/css/main.css");
        let start = out.text.find(PREFIX).unwrap() + PREFIX.len();
        let end = out.text.rfind(')').unwrap();
        let decoded = percent_decode_str(&out.text[start..end]).decode_utf8().unwrap();
        assert_eq!(decoded, "https://site.test/img/p.png?v=2");
    }

    #[test]
    fn test_rewriting_own_output_is_a_no_op() {
        let html = r#"<img src="/logo.png"><a href='//cdn.test/a'>a</a><style>x{y:url(bg.jpg)}</style>"#;
        let once = rewrite(html, "https://example.com/page");
        let twice = rewrite(&once.text, "https://example.com/page");
        assert_eq!(twice.text, once.text);
        assert_eq!((twice.attributes, twice.css_urls), (0, 0));
    }

    #[test]
    fn test_own_output_is_recognised_whatever_the_host_spelling() {
        let rewriter = ContentRewriter::new().unwrap();
        let base = Url::parse("https://example.com/page").unwrap();
        let prefix = ProxyPrefix::new("http", "MyProxy.Example:80", "/api/proxy");

        let once = rewriter.rewrite(r#"<img src="/logo.png">"#, &base, &prefix);
        assert_eq!(once.attributes, 1);
        let twice = rewriter.rewrite(&once.text, &base, &prefix);
        assert_eq!(twice.text, once.text);
        assert_eq!(twice.attributes, 0);
    }
}
