use axum::debug_handler;
use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use garmin_connect_client::config::Config;
use garmin_connect_mcp::{GarminMcpHandler, telemetry};

struct AppState {
    metrics: PrometheusHandle,
}

#[debug_handler]
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[debug_handler]
async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.metrics.render();
    ([("content-type", "text/plain; version=0.0.4")], body)
}

/// Listen address from `ADDRESS`, default 127.0.0.1:3000.
fn listen_addr_from(value: Option<String>) -> SocketAddr {
    value
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)))
}

fn build_router(handler: GarminMcpHandler, state: Arc<AppState>) -> Router {
    // Build rmcp StreamableHttpService mounted at /mcp
    let factory = move || -> Result<_, std::io::Error> { Ok(handler.clone()) };
    let session = Arc::new(
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default(),
    );
    let mcp_service = rmcp::transport::streamable_http_server::tower::StreamableHttpService::new(
        factory,
        session,
        rmcp::transport::streamable_http_server::tower::StreamableHttpServerConfig::default(),
    );

    Router::new()
        .route("/health", get(health))
        .route(
            "/metrics",
            get(metrics_endpoint).layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(10),
            )),
        )
        .nest_service("/mcp", mcp_service)
        .with_state(state)
}


#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let log_level = telemetry::init();
    tracing::info!(%log_level, "garmin_connect_mcp:http: log filter");

    let handle = PrometheusBuilder::new().install_recorder()?;

    let config = Config::load();
    if let Err(e) = config.credentials() {
        tracing::error!(error = %e, "missing credentials; aborting startup");
        std::process::exit(1);
    }

    let handler = GarminMcpHandler::from_config(config);
    let state = Arc::new(AppState {
        metrics: handle.clone(),
    });
    let app = build_router(handler, state);

    let addr = listen_addr_from(std::env::var("ADDRESS").ok());
    info!(%addr, "starting HTTP server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app.into_make_service());
    if let Err(e) = server
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("failed to install ctrl+c handler: {e}");
            }
        })
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
