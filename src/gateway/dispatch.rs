//! Response dispatch: redirect rewrite, HTML rewrite, or raw passthrough.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
};
use url::Url;

use crate::error::ProxyError;
use crate::rewrite::{html::rewrite_html, redirect};
use crate::upstream::OriginResponse;

/// How an origin response was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Redirect,
    Html,
    Passthrough,
}

impl Dispatch {
    /// `head` marks a response to a HEAD request, which carries no body.
    pub fn classify(status: StatusCode, headers: &HeaderMap, head: bool) -> Self {
        if redirect::is_redirect(status) {
            return Dispatch::Redirect;
        }
        if head || is_bodiless(status) {
            return Dispatch::Passthrough;
        }
        let is_html = headers
            .get(header::CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).contains("text/html"))
            .unwrap_or(false);
        if is_html {
            Dispatch::Html
        } else {
            Dispatch::Passthrough
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dispatch::Redirect => "redirect",
            Dispatch::Html => "html",
            Dispatch::Passthrough => "passthrough",
        }
    }
}

/// 1xx, 204 and 304 never carry a body, so there is nothing to rewrite.
fn is_bodiless(status: StatusCode) -> bool {
    status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

/// Turn an origin response into the client response body and headers.
///
/// `target` supplies the origin inserted into root-relative HTML links.
pub async fn dispatch(
    origin: OriginResponse,
    target: &Url,
    head: bool,
    max_html_bytes: usize,
) -> Result<(Response<Body>, Dispatch), ProxyError> {
    let OriginResponse {
        status,
        url,
        mut headers,
        body,
    } = origin;
    let kind = Dispatch::classify(status, &headers, head);

    let body = match kind {
        Dispatch::Redirect => {
            redirect::rewrite_location(&mut headers, &url)?;
            headers.remove(header::CONTENT_LENGTH);
            Body::empty()
        }
        Dispatch::Html => {
            let bytes = axum::body::to_bytes(body, max_html_bytes)
                .await
                .map_err(|e| ProxyError::Transform(format!("Failed to read HTML body: {}", e)))?;
            let text = String::from_utf8_lossy(&bytes);
            let rewritten = rewrite_html(&text, &target.origin().ascii_serialization());
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
            Body::from(rewritten)
        }
        Dispatch::Passthrough => body,
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok((response, kind))
}
