//! The proxying pipeline.
//!
//! # Data Flow
//! ```text
//! client request
//!     → rewrite::target (extract + normalize target URL)
//!     → security::headers (sanitize, per-host rules)
//!     → upstream::fetcher (single origin round-trip)
//!     → rewrite::cookies (Set-Cookie Domain/Path)
//!     → dispatch.rs (redirect | html | passthrough)
//!     → http::response::finalize_headers (no-store + CORS)
//! ```
//!
//! `Gateway::handle` knows nothing about the server it is mounted in: it
//! maps a request to a response or a [`ProxyError`], and the caller decides
//! how errors are rendered.

pub mod dispatch;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, Response},
};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::ProxyError;
use crate::http::response::finalize_headers;
use crate::rewrite::{cookies::rewrite_set_cookies, extract_target, ClientScheme};
use crate::security::headers::strip_hop_by_hop;
use crate::security::{HeaderRuleSet, RequestSanitizer};
use crate::upstream::{OriginFetcher, OutgoingRequest};

pub use dispatch::Dispatch;

/// A rewritten response plus how it was produced.
pub struct Proxied {
    pub target: Url,
    pub dispatch: Dispatch,
    pub response: Response<Body>,
}

/// Request/response rewriting pipeline around an [`OriginFetcher`].
pub struct Gateway<F> {
    fetcher: F,
    sanitizer: RequestSanitizer,
    cookie_domain: String,
    max_html_bytes: usize,
    /// Deadline for the origin's response head, plus HTML buffering.
    request_timeout: Option<Duration>,
}

impl<F: OriginFetcher> Gateway<F> {
    pub fn new(fetcher: F, config: &GatewayConfig, rules: Arc<HeaderRuleSet>) -> Self {
        Self {
            fetcher,
            sanitizer: RequestSanitizer::new(config.internal_header_prefix.clone(), rules),
            cookie_domain: config.cookie_domain.clone(),
            max_html_bytes: config.max_html_bytes,
            request_timeout: None,
        }
    }

    /// Bound how long the origin may take before the request fails as upstream.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Proxy one request.
    pub async fn handle(
        &self,
        request: Request<Body>,
        scheme: ClientScheme,
    ) -> Result<Proxied, ProxyError> {
        let (parts, body) = request.into_parts();
        let target = extract_target(parts.uri.path(), parts.uri.query(), scheme)?;

        tracing::debug!(
            method = %parts.method,
            target = %target,
            "Forwarding to origin"
        );

        let head = parts.method == Method::HEAD;
        let outgoing = self.prepare(parts.method, parts.headers, body, &target);
        let exchange = self.exchange(outgoing, &target, head);

        let (mut response, dispatch) = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                ProxyError::Upstream(format!(
                    "Origin did not respond within {}s",
                    limit.as_secs_f64()
                ))
            })??,
            None => exchange.await?,
        };
        finalize_headers(response.headers_mut());

        Ok(Proxied {
            target,
            dispatch,
            response,
        })
    }

    /// Fetch from the origin and rewrite the response it returns.
    async fn exchange(
        &self,
        outgoing: OutgoingRequest,
        target: &Url,
        head: bool,
    ) -> Result<(Response<Body>, Dispatch), ProxyError> {
        let mut origin = self.fetcher.fetch(outgoing).await?;

        strip_hop_by_hop(&mut origin.headers);
        rewrite_set_cookies(&mut origin.headers, &self.cookie_domain)?;

        dispatch::dispatch(origin, target, head, self.max_html_bytes).await
    }

    fn prepare(
        &self,
        method: Method,
        mut headers: HeaderMap,
        body: Body,
        target: &Url,
    ) -> OutgoingRequest {
        self.sanitizer.sanitize(target, &mut headers);

        let body = if method == Method::GET || method == Method::HEAD {
            headers.remove(header::CONTENT_LENGTH);
            None
        } else {
            Some(body)
        };

        OutgoingRequest {
            method,
            url: target.clone(),
            headers,
            body,
        }
    }
}
