//! `Set-Cookie` attribute rewriting.
//!
//! Every directive gets its `Domain` pinned to the gateway's cookie domain and
//! a `Path=/` when it has none. Attributes are found by splitting on `;` and
//! comparing the attribute name, so cookie values or dates containing
//! `domain=` or `path=` are left alone.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

use crate::error::ProxyError;

/// Rewrite a single `Set-Cookie` value.
pub fn rewrite_cookie(directive: &str, domain: &str) -> String {
    let mut segments = directive.split(';').map(str::trim);
    let mut out: Vec<String> = vec![segments.next().unwrap_or_default().to_string()];
    let mut has_domain = false;
    let mut has_path = false;

    for segment in segments.filter(|s| !s.is_empty()) {
        let name = segment.split_once('=').map(|(name, _)| name.trim());
        match name {
            Some(name) if name.eq_ignore_ascii_case("domain") => {
                has_domain = true;
                out.push(format!("Domain={}", domain));
            }
            Some(name) if name.eq_ignore_ascii_case("path") => {
                has_path = true;
                out.push(segment.to_string());
            }
            _ => out.push(segment.to_string()),
        }
    }

    if !has_domain {
        out.push(format!("Domain={}", domain));
    }
    if !has_path {
        out.push("Path=/".to_string());
    }

    out.join("; ")
}

/// Rewrite every `Set-Cookie` header in place, one output per input.
pub fn rewrite_set_cookies(headers: &mut HeaderMap, domain: &str) -> Result<(), ProxyError> {
    let rewritten = headers
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| {
            let directive = String::from_utf8_lossy(value.as_bytes());
            HeaderValue::from_str(&rewrite_cookie(&directive, domain))
                .map_err(|e| ProxyError::Transform(format!("Invalid Set-Cookie after rewrite: {}", e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if rewritten.is_empty() {
        return Ok(());
    }

    headers.remove(SET_COOKIE);
    for value in rewritten {
        headers.append(SET_COOKIE, value);
    }
    Ok(())
}
