//! Redirect re-targeting.
//!
//! A `Location` is resolved against the URL the response came from, so
//! absolute and relative values share one code path, then routed back
//! through the gateway.

use axum::http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode};
use url::Url;

use crate::error::ProxyError;
use crate::rewrite::encoding::proxy_path;

/// Statuses whose `Location` is rewritten instead of followed.
pub fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Point `Location` (if present) at the gateway.
pub fn rewrite_location(headers: &mut HeaderMap, base: &Url) -> Result<(), ProxyError> {
    let Some(location) = headers.get(LOCATION) else {
        return Ok(());
    };

    let location = location
        .to_str()
        .map_err(|_| ProxyError::Transform("Location header is not valid text".to_string()))?;
    let resolved = base.join(location).map_err(|e| {
        ProxyError::Transform(format!("Cannot resolve Location `{}`: {}", location, e))
    })?;

    let value = HeaderValue::from_str(&proxy_path(&resolved))
        .map_err(|e| ProxyError::Transform(format!("Invalid Location after rewrite: {}", e)))?;
    headers.insert(LOCATION, value);
    Ok(())
}
