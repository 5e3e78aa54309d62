//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on `GET /`
//! - Wire up middleware (request ID, tracing, overall timeout)
//! - Own the shared upstream client and inject it into handlers
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, RawQuery, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{caller_ip, request_id, url_param, UuidRequestId};
use crate::http::response::stream_response;
use crate::observability::metrics;
use crate::proxy::ImagePipeline;
use crate::upstream::UpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ImagePipeline,
    pub trust_forwarded_headers: bool,
}

/// HTTP server for the image proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    client: Arc<UpstreamClient>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        // Built on first use, shared by every request afterwards
        let client = Arc::new(UpstreamClient::new(&config.upstream));

        let state = AppState {
            pipeline: ImagePipeline::new(&config, client.clone()),
            trust_forwarded_headers: config.upstream.trust_forwarded_headers,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            client,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            fallback_enabled = self.config.fallback.enabled,
            gateway = %self.config.fallback.gateway_base,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The connection pool shared by every request this server handles.
    pub fn upstream_client(&self) -> Arc<UpstreamClient> {
        self.client.clone()
    }
}

/// Main proxy handler: `GET /?url=<target>`.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers).to_string();
    let caller = caller_ip(&headers, peer, state.trust_forwarded_headers);
    let raw_url = url_param(query.as_deref());

    tracing::debug!(
        request_id = %request_id,
        url = raw_url.as_deref().unwrap_or_default(),
        caller = %caller,
        "Proxying image request"
    );

    match state.pipeline.fetch(raw_url.as_deref(), Some(caller)).await {
        Ok(proxied) => {
            let status = proxied.upstream.status();
            tracing::info!(
                request_id = %request_id,
                source = proxied.source.as_str(),
                status = %status,
                "Streaming upstream response"
            );
            metrics::record_request(proxied.source.as_str(), status.as_u16(), start_time);
            stream_response(proxied, &request_id)
        }
        Err(e) => {
            let status = e.status();
            if status.is_client_error() {
                tracing::debug!(request_id = %request_id, status = %status, error = %e, "Request rejected");
            } else {
                tracing::warn!(request_id = %request_id, status = %status, error = %e, "Request failed");
            }
            metrics::record_request("rejected", status.as_u16(), start_time);
            e.into_response()
        }
    }
}
