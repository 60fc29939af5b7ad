//! Response shaping.
//!
//! # Responsibilities
//! - Add the headers every proxied response carries (no-store, CORS)
//! - Serve the bundled landing page

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};

const LANDING_PAGE: &str = include_str!("../../assets/index.html");

/// Applied last, after cookie and body/redirect rewriting.
pub fn finalize_headers(headers: &mut HeaderMap) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
}

pub fn landing_page() -> Response {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        LANDING_PAGE,
    )
        .into_response()
}
