//! Proxy link encoding.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Bytes left as-is when a URL is embedded as a query-parameter value.
///
/// Same unreserved set as JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Self-referential URL template: `{proto}://{host}{mount_path}?target=`.
///
/// Stored in the serialized form `Url` produces (lowercase scheme and host,
/// default port dropped) so resolved references can be compared against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPrefix(String);

impl ProxyPrefix {
    pub fn new(proto: &str, host: &str, mount_path: &str) -> Self {
        let raw = format!("{proto}://{host}{mount_path}");
        let base = match Url::parse(&raw) {
            Ok(url) => String::from(url),
            Err(_) => raw,
        };
        Self(format!("{base}?target="))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProxyPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the link a client follows to fetch `absolute` through the proxy.
pub fn encode(prefix: &ProxyPrefix, absolute: &Url) -> String {
    let mut link = String::with_capacity(prefix.0.len() + absolute.as_str().len() * 2);
    link.push_str(&prefix.0);
    link.extend(utf8_percent_encode(absolute.as_str(), COMPONENT));
    link
}
