//! Shared utilities for integration testing.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use tokio::net::TcpListener;

use path_gateway::config::ProxyConfig;
use path_gateway::rewrite::encode_component;
use path_gateway::{HttpServer, Shutdown};

pub const PAGE_HTML: &str =
    r#"<a href="/a">x</a><img src="//cdn.example.com/i.png"><a href="https://abs.example.com/">y</a>"#;

/// Not valid UTF-8 on purpose: passthrough must not touch it.
pub const IMAGE_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0xfe, 0x00];

async fn page() -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], PAGE_HTML).into_response()
}

async fn redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/next")], "moved").into_response()
}

async fn cookies() -> Response {
    let mut headers = HeaderMap::new();
    headers.append(header::SET_COOKIE, "sid=1; Domain=origin.test; HttpOnly".parse().unwrap());
    headers.append(header::SET_COOKIE, "theme=dark".parse().unwrap());
    (headers, "ok").into_response()
}

async fn image() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], Bytes::from_static(IMAGE_BYTES)).into_response()
}

/// Reflect what the origin received as JSON.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<serde_json::Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string()))
        .collect();
    Json(serde_json::json!({
        "method": method.as_str(),
        "uri": uri.to_string(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Start the mock origin on an ephemeral loopback port.
pub async fn start_mock_origin() -> SocketAddr {
    let router = Router::new()
        .route("/page", get(page))
        .route("/redirect", get(redirect))
        .route("/cookies", get(cookies))
        .route("/image.png", get(image))
        .route("/echo", any(echo));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Sets its flag when the origin handler holding it is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Start an origin whose `/hang` route answers only after 20s.
///
/// `dropped` flips to true once the in-flight handler is cancelled.
pub async fn start_hanging_origin(dropped: Arc<AtomicBool>) -> SocketAddr {
    let router = Router::new().route(
        "/hang",
        get(move || {
            let guard = DropFlag(dropped.clone());
            async move {
                tokio::time::sleep(Duration::from_secs(20)).await;
                drop(guard);
                "late"
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Poll `flag` until it is set or `within` elapses.
pub async fn wait_for(flag: &AtomicBool, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if flag.load(Ordering::SeqCst) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    flag.load(Ordering::SeqCst)
}

/// A running gateway; dropping it leaves the task to die with the runtime.
pub struct TestGateway {
    pub addr: SocketAddr,
    #[allow(dead_code)]
    pub shutdown: Shutdown,
}

impl TestGateway {
    /// Gateway URL for an encoded target.
    pub fn url_for(&self, target: &str) -> String {
        format!("http://{}/{}", self.addr, encode_component(target))
    }
}

pub async fn start_gateway(config: ProxyConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });
    TestGateway { addr, shutdown }
}

/// Client that neither follows redirects nor picks up proxy env vars.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
