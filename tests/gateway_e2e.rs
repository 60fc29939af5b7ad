//! End-to-end tests: client → gateway → mock origin over real sockets.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use path_gateway::config::{HeaderDirective, ProxyConfig};
use path_gateway::rewrite::encode_component;

mod common;

fn loopback_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.gateway.cookie_domain = "gateway.test".into();
    config
}

#[tokio::test]
async fn test_landing_page() {
    let gateway = common::start_gateway(loopback_config()).await;
    let resp = common::client()
        .get(format!("http://{}/", gateway.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
    assert!(resp.text().await.unwrap().contains("<form"));
}

#[tokio::test]
async fn test_html_links_rewritten() {
    let origin = common::start_mock_origin().await;
    let gateway = common::start_gateway(loopback_config()).await;
    let resp = common::client()
        .get(gateway.url_for(&format!("http://{}/page", origin)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-store");
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert_eq!(resp.headers()["access-control-allow-methods"], "GET, POST, PUT, DELETE");
    assert_eq!(resp.headers()["access-control-allow-headers"], "*");

    let declared: usize = resp.headers()["content-length"].to_str().unwrap().parse().unwrap();
    let body = resp.text().await.unwrap();
    assert_eq!(declared, body.len());

    let encoded_origin = encode_component(&format!("http://{}", origin));
    assert!(body.contains(&format!(r#"href="/{}/a""#, encoded_origin)));
    assert!(body.contains(r#"src="/https%3A%2F%2Fcdn.example.com""#));
    assert!(body.contains(r#"href="https://abs.example.com/""#));
}

#[tokio::test]
async fn test_redirect_location_rewritten() {
    let origin = common::start_mock_origin().await;
    let gateway = common::start_gateway(loopback_config()).await;
    let resp = common::client()
        .get(gateway.url_for(&format!("http://{}/redirect", origin)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    let expected = format!("/{}", encode_component(&format!("http://{}/next", origin)));
    assert_eq!(resp.headers()["location"], expected.as_str());
    assert_eq!(resp.headers()["cache-control"], "no-store");
    assert!(resp.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_cookies_rewritten_individually() {
    let origin = common::start_mock_origin().await;
    let gateway = common::start_gateway(loopback_config()).await;
    let resp = common::client()
        .get(gateway.url_for(&format!("http://{}/cookies", origin)))
        .send()
        .await
        .unwrap();

    let cookies: Vec<_> = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(
        cookies,
        vec![
            "sid=1; Domain=gateway.test; HttpOnly; Path=/".to_string(),
            "theme=dark; Domain=gateway.test; Path=/".to_string(),
        ]
    );
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_binary_passthrough() {
    let origin = common::start_mock_origin().await;
    let gateway = common::start_gateway(loopback_config()).await;
    let resp = common::client()
        .get(gateway.url_for(&format!("http://{}/image.png", origin)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "image/png");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), common::IMAGE_BYTES);
}

#[tokio::test]
async fn test_malformed_encoding_is_400() {
    let gateway = common::start_gateway(loopback_config()).await;
    let resp = common::client()
        .get(format!("http://{}/%E0%A4%A", gateway.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers()["content-type"], "application/json; charset=utf-8");
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid URL encoding.");
}

#[tokio::test]
async fn test_unreachable_origin_is_500() {
    let gateway = common::start_gateway(loopback_config()).await;
    // Port 9 (discard) is closed on loopback in any sane test environment.
    let resp = common::client()
        .get(gateway.url_for("http://127.0.0.1:9/"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_wildcard_rule_strips_origin_and_referer() {
    let origin = common::start_mock_origin().await;
    let gateway = common::start_gateway(loopback_config()).await;
    let resp = common::client()
        .get(gateway.url_for(&format!("http://{}/echo", origin)))
        .header("origin", "http://evil.test")
        .header("referer", "http://evil.test/page")
        .header("cf-connecting-ip", "203.0.113.9")
        .header("x-kept", "yes")
        .header("x-request-id", "client-chosen-id")
        .send()
        .await
        .unwrap();

    let echoed: serde_json::Value = resp.json().await.unwrap();
    let headers = &echoed["headers"];
    assert!(headers.get("origin").is_none());
    assert!(headers.get("referer").is_none());
    assert!(headers.get("cf-connecting-ip").is_none());
    assert!(headers.get("x-request-id").is_none());
    assert_eq!(headers["x-kept"], "yes");
    assert_eq!(headers["host"], origin.to_string());
}

#[tokio::test]
async fn test_host_rule_from_config() {
    let origin = common::start_mock_origin().await;
    let mut config = loopback_config();
    config.header_rules.insert(
        "127.0.0.1".into(),
        BTreeMap::from([
            ("referer".to_string(), HeaderDirective::Set("https://www.example.test/".into())),
            ("x-secret".to_string(), HeaderDirective::Delete),
        ]),
    );
    let gateway = common::start_gateway(config).await;

    let resp = common::client()
        .get(gateway.url_for(&format!("http://{}/echo", origin)))
        .header("referer", "http://evil.test/page")
        .header("x-secret", "hunter2")
        .send()
        .await
        .unwrap();

    let echoed: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(echoed["headers"]["referer"], "https://www.example.test/");
    assert!(echoed["headers"].get("x-secret").is_none());
}

#[tokio::test]
async fn test_post_body_forwarded() {
    let origin = common::start_mock_origin().await;
    let gateway = common::start_gateway(loopback_config()).await;
    let resp = common::client()
        .post(gateway.url_for(&format!("http://{}/echo", origin)))
        .body("a=1&b=2")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["body"], "a=1&b=2");
}

#[tokio::test]
async fn test_query_string_forwarded() {
    let origin = common::start_mock_origin().await;
    let gateway = common::start_gateway(loopback_config()).await;
    let url = format!("{}?q=rust", gateway.url_for(&format!("http://{}/echo", origin)));
    let resp = common::client().get(url).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(echoed["uri"], "/echo?q=rust");
}

#[tokio::test]
async fn test_request_id_propagated() {
    let origin = common::start_mock_origin().await;
    let gateway = common::start_gateway(loopback_config()).await;
    let client = common::client();

    let generated = client
        .get(gateway.url_for(&format!("http://{}/image.png", origin)))
        .send()
        .await
        .unwrap();
    let id = generated.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(id.len(), 36);

    let supplied = client
        .get(gateway.url_for(&format!("http://{}/image.png", origin)))
        .header("x-request-id", "client-chosen-id")
        .send()
        .await
        .unwrap();
    assert_eq!(supplied.headers()["x-request-id"], "client-chosen-id");
}

#[tokio::test]
async fn test_slow_origin_is_json_500() {
    let dropped = Arc::new(AtomicBool::new(false));
    let origin = common::start_hanging_origin(dropped.clone()).await;
    let mut config = loopback_config();
    config.timeouts.request_secs = 1;
    let gateway = common::start_gateway(config).await;

    let resp = common::client()
        .get(gateway.url_for(&format!("http://{}/hang", origin)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers()["content-type"], "application/json; charset=utf-8");
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("did not respond"));
    assert!(common::wait_for(&dropped, Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_client_disconnect_cancels_origin_request() {
    let dropped = Arc::new(AtomicBool::new(false));
    let origin = common::start_hanging_origin(dropped.clone()).await;
    let gateway = common::start_gateway(loopback_config()).await;

    let impatient = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let result = impatient
        .get(gateway.url_for(&format!("http://{}/hang", origin)))
        .send()
        .await;
    assert!(result.unwrap_err().is_timeout());

    assert!(common::wait_for(&dropped, Duration::from_secs(5)).await);
}
