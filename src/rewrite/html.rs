//! In-body link rewriting for HTML documents.
//!
//! Only `href`, `src` and `action` attribute values are touched, via plain
//! text substitution on the markup. Two passes, in order:
//!
//! 1. root-relative (`href="/path"`): the encoded target origin is inserted
//!    after the leading slash.
//! 2. protocol-relative (`src="//host/..."`): the value becomes the gateway
//!    path for `https://host`. Anything after the host is dropped.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rewrite::encoding::encode_component;

static ROOT_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(href|src|action)=(["'])/([^/]|$)"#).expect("root-relative pattern")
});

static PROTOCOL_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(href|src|action)=(["'])//([^/"']+)[^"']*"#).expect("protocol-relative pattern")
});

/// Rewrite links in `html` served from `origin` (e.g. `https://a.com`).
pub fn rewrite_html(html: &str, origin: &str) -> String {
    let encoded_origin = encode_component(origin);

    let rooted = ROOT_RELATIVE.replace_all(html, |caps: &Captures| {
        format!("{}={}/{}/{}", &caps[1], &caps[2], encoded_origin, &caps[3])
    });

    PROTOCOL_RELATIVE
        .replace_all(&rooted, |caps: &Captures| {
            let host = encode_component(&format!("https://{}", &caps[3]));
            format!("{}={}/{}", &caps[1], &caps[2], host)
        })
        .into_owned()
}
