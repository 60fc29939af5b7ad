//! Request header sanitization.
//!
//! # Responsibilities
//! - Strip headers injected by the hosting platform (configurable prefix)
//! - Keep gateway-internal headers such as the request id off the origin request
//! - Strip hop-by-hop headers in both directions
//! - Apply the per-hostname override table to outgoing requests

use std::sync::{Arc, LazyLock};

use axum::http::{header, HeaderMap, HeaderName};
use url::Url;

use crate::http::X_REQUEST_ID;
use crate::security::rules::HeaderRuleSet;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "proxy-authenticate",
        "proxy-authorization",
        "te",
        "trailer",
        "transfer-encoding",
        "upgrade",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Remove hop-by-hop headers.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Remove every header whose name starts with `prefix` (ASCII case-insensitive).
pub fn strip_prefixed(headers: &mut HeaderMap, prefix: &str) {
    if prefix.is_empty() {
        return;
    }
    let prefix = prefix.to_ascii_lowercase();
    let doomed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(&prefix))
        .cloned()
        .collect();
    for name in doomed {
        headers.remove(name);
    }
}

/// Prepares client headers for the origin.
#[derive(Debug, Clone)]
pub struct RequestSanitizer {
    internal_prefix: String,
    rules: Arc<HeaderRuleSet>,
}

impl RequestSanitizer {
    pub fn new(internal_prefix: impl Into<String>, rules: Arc<HeaderRuleSet>) -> Self {
        Self {
            internal_prefix: internal_prefix.into(),
            rules,
        }
    }

    pub fn sanitize(&self, target: &Url, headers: &mut HeaderMap) {
        strip_prefixed(headers, &self.internal_prefix);
        strip_hop_by_hop(headers);
        // The client derives Host from the target; compression is negotiated
        // by the origin client so HTML bodies arrive decoded.
        headers.remove(header::HOST);
        headers.remove(header::ACCEPT_ENCODING);
        headers.remove(X_REQUEST_ID);

        self.rules.apply(target.host_str().unwrap_or_default(), headers);
    }
}
