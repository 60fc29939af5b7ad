//! Gateway error types.
//!
//! Failures are tagged by the pipeline stage that produced them and only
//! turned into an HTTP status at the outermost boundary (`IntoResponse`).

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::security::rules::RuleError;

/// Per-request pipeline failure.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The request path is not valid percent-encoded UTF-8.
    #[error("Invalid URL encoding.")]
    Decode,

    /// The decoded target could not be parsed as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidTarget(#[from] url::ParseError),

    /// The origin could not be reached (DNS, TLS, connect, read).
    #[error("{0}")]
    Upstream(String),

    /// Header, cookie, redirect or body rewriting failed.
    #[error("{0}")]
    Transform(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Decode => StatusCode::BAD_REQUEST,
            ProxyError::InvalidTarget(_)
            | ProxyError::Upstream(_)
            | ProxyError::Transform(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short stage name for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            ProxyError::Decode => "decode",
            ProxyError::InvalidTarget(_) => "target",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::Transform(_) => "transform",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        response
    }
}

/// Errors raised while assembling the server at startup.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to build origin client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid header rules: {0}")]
    Rules(#[from] RuleError),
}
