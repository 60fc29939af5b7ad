//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) as early as possible for tracing
//! - Determine the scheme the client used to reach the gateway

use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::rewrite::ClientScheme;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID of an incoming request, or `unknown`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Scheme of the client connection.
///
/// `X-Forwarded-Proto` (first entry) wins when trusted and recognised;
/// otherwise the listener's own scheme is used.
pub fn client_scheme(headers: &HeaderMap, trust_forwarded: bool, listener: ClientScheme) -> ClientScheme {
    if !trust_forwarded {
        return listener;
    }

    let forwarded = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);

    match forwarded {
        Some(proto) if proto.eq_ignore_ascii_case("https") => ClientScheme::Https,
        Some(proto) if proto.eq_ignore_ascii_case("http") => ClientScheme::Http,
        _ => listener,
    }
}
