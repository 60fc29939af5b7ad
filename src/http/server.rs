//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the landing page and the proxy catch-all
//! - Wire up middleware (request ID, tracing)
//! - Bind server to a plain or TLS listener
//! - Render pipeline errors and record per-request metrics

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::StartupError;
use crate::gateway::Gateway;
use crate::http::request::{client_scheme, request_id, MakeRequestUuidV4};
use crate::http::response::landing_page;
use crate::observability::metrics;
use crate::rewrite::ClientScheme;
use crate::security::HeaderRuleSet;
use crate::upstream::{OriginFetcher, ReqwestFetcher};

/// Grace period for in-flight requests once shutdown starts (TLS listener).
const TLS_DRAIN_SECS: u64 = 10;

/// Application state injected into handlers.
pub struct AppState<F> {
    pub gateway: Arc<Gateway<F>>,
    pub trust_forwarded_proto: bool,
    pub listener_scheme: ClientScheme,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            trust_forwarded_proto: self.trust_forwarded_proto,
            listener_scheme: self.listener_scheme,
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server backed by the `reqwest` origin client.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let fetcher = ReqwestFetcher::new(&config.timeouts)?;
        Self::with_fetcher(config, fetcher)
    }

    /// Create a server around any origin fetcher.
    pub fn with_fetcher<F: OriginFetcher>(config: ProxyConfig, fetcher: F) -> Result<Self, StartupError> {
        let rules = Arc::new(HeaderRuleSet::compile(&config.header_rules)?);
        let gateway = Arc::new(
            Gateway::new(fetcher, &config.gateway, rules)
                .with_request_timeout(Duration::from_secs(config.timeouts.request_secs)),
        );

        let listener_scheme = if config.listener.tls.is_some() {
            ClientScheme::Https
        } else {
            ClientScheme::Http
        };

        let state = AppState {
            gateway,
            trust_forwarded_proto: config.gateway.trust_forwarded_proto,
            listener_scheme,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The request deadline is enforced inside the gateway, where it
    /// surfaces as a `ProxyError`.
    fn build_router<F: OriginFetcher>(state: AppState<F>) -> Router {
        Router::new()
            .route("/", any(landing_handler))
            .route("/{*path}", any(proxy_handler::<F>))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server on a plain TCP listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS termination until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

async fn landing_handler(method: Method) -> Response {
    let start = Instant::now();
    let response = landing_page();
    metrics::record_request(method.as_str(), response.status().as_u16(), "landing", start);
    response
}

/// Main proxy handler: runs the gateway pipeline and renders failures.
async fn proxy_handler<F: OriginFetcher>(
    State(state): State<AppState<F>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let scheme = client_scheme(
        request.headers(),
        state.trust_forwarded_proto,
        state.listener_scheme,
    );

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Proxying request"
    );

    match state.gateway.handle(request, scheme).await {
        Ok(proxied) => {
            let status = proxied.response.status();
            tracing::info!(
                request_id = %request_id,
                method = %method,
                target = %proxied.target,
                status = status.as_u16(),
                dispatch = proxied.dispatch.as_str(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Request proxied"
            );
            metrics::record_request(method.as_str(), status.as_u16(), proxied.dispatch.as_str(), start);
            proxied.response
        }
        Err(e) => {
            let status = e.status_code();
            if status.is_client_error() {
                tracing::warn!(request_id = %request_id, stage = e.stage(), error = %e, "Rejected request");
            } else {
                tracing::error!(request_id = %request_id, stage = e.stage(), error = %e, "Proxy pipeline failed");
            }
            metrics::record_request(method.as_str(), status.as_u16(), "error", start);
            e.into_response()
        }
    }
}
