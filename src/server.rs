use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{error, info};
use std::sync::Arc;

use crate::fleet::Fleet;
use crate::metrics::MetricStore;
use crate::providers::gitlab::GitLabClient;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<MetricStore>,
    pub fleet: Arc<Fleet>,
    pub client: Arc<GitLabClient>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
        .with_state(state)
}

/// Turn `:8080` into `0.0.0.0:8080`.
pub fn normalize_listen_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_owned()
    }
}

/// Serve the exposition and health endpoints until Ctrl-C.
pub async fn serve(listen_address: &str, state: AppState) -> Result<()> {
    let address = normalize_listen_address(listen_address);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Unable to listen on {address}"))?;

    info!("-> Serving metrics on http://{address}/metrics");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("-> Shutting down");
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("Unable to render metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn live(State(state): State<AppState>) -> StatusCode {
    if state.fleet.active() == state.fleet.launched() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn ready(State(state): State<AppState>) -> StatusCode {
    if state.client.is_reachable().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
