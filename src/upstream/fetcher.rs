//! Origin fetcher.
//!
//! # Responsibilities
//! - Issue exactly one request per proxied call (no retries)
//! - Never follow redirects; the pipeline rewrites them
//! - Stream request and response bodies without buffering
//!
//! Dropping the returned future (client went away) drops the in-flight
//! origin exchange with it.

use std::future::Future;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Method, StatusCode},
};
use url::Url;

use crate::config::TimeoutConfig;
use crate::error::ProxyError;

/// Request handed to the origin.
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` for GET/HEAD.
    pub body: Option<Body>,
}

/// Response as received from the origin.
pub struct OriginResponse {
    pub status: StatusCode,
    /// URL the response was served from.
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

/// Anything able to perform the single origin round-trip.
pub trait OriginFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = Result<OriginResponse, ProxyError>> + Send;
}

/// `reqwest`-backed fetcher used by the server.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;
        Ok(Self { client })
    }
}

impl OriginFetcher for ReqwestFetcher {
    async fn fetch(&self, request: OutgoingRequest) -> Result<OriginResponse, ProxyError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        Ok(OriginResponse {
            status: response.status(),
            url: response.url().clone(),
            headers: response.headers().clone(),
            body: Body::from_stream(response.bytes_stream()),
        })
    }
}
