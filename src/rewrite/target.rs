//! Target URL extraction from the request path.
//!
//! `GET /https%3A%2F%2Fexample.com%2Fpage?lang=en` targets
//! `https://example.com/page?lang=en`.

use url::Url;

use crate::error::ProxyError;
use crate::rewrite::encoding::decode_component;

/// Scheme the client used to reach the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientScheme {
    Http,
    Https,
}

impl ClientScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientScheme::Http => "http",
            ClientScheme::Https => "https",
        }
    }
}

/// Decode the path, supply a scheme when missing, reattach the query.
///
/// Only malformed percent-encoding yields [`ProxyError::Decode`]; an
/// unparseable result is [`ProxyError::InvalidTarget`].
pub fn extract_target(
    path: &str,
    query: Option<&str>,
    scheme: ClientScheme,
) -> Result<Url, ProxyError> {
    let encoded = path.strip_prefix('/').unwrap_or(path);
    let mut raw = decode_component(encoded)?;

    if !has_http_scheme(&raw) {
        raw = format!("{}://{}", scheme.as_str(), raw);
    }

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        raw.push('?');
        raw.push_str(query);
    }

    Ok(Url::parse(&raw)?)
}

fn has_http_scheme(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    ["http://", "https://"].iter().any(|prefix| {
        bytes
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
    })
}
