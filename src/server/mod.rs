//! HTTP services for the biosensor and quantum entropy nodes.
//!
//! Both services share the same plumbing: permissive CORS, request
//! tracing, JSON 404s, a Prometheus `/metrics` endpoint and graceful
//! shutdown on Ctrl-C.

pub mod biosensor;
pub mod quantum;
mod rate_limit;

pub use rate_limit::RateLimiter;

use crate::metrics::MetricsRegistry;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Errors that can occur while running a service.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Host and port do not form a socket address.
    #[error("invalid listen address {0}")]
    Address(String),

    /// The listener could not be bound.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// JSON error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<String>,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
            retry_after: None,
        }),
    )
}

pub(crate) fn rate_limited() -> ApiError {
    let (status, Json(mut body)) = api_error(
        StatusCode::TOO_MANY_REQUESTS,
        "Rate limit exceeded",
        "Too many requests. Please wait before trying again.",
    );
    body.retry_after = Some("60 seconds".to_string());
    (status, Json(body))
}

async fn not_found() -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "Not found",
        "The requested endpoint does not exist",
    )
}

/// Renders the registry in Prometheus text format.
pub(crate) fn metrics_response(registry: &MetricsRegistry) -> Response {
    match registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

/// Adds the layers common to both services.
pub(crate) fn finish(router: Router) -> Router {
    router
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Parses `host:port` into a socket address.
pub fn listen_addr(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|_| ServerError::Address(format!("{}:{}", host, port)))
}

/// Serves `app` on `addr` until Ctrl-C.
pub async fn serve(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Service listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Service shutting down");
    })
    .await
    .map_err(|e| ServerError::Server(e.to_string()))
}
