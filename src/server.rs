//! HTTP transport for the search service.
//!
//! `POST /query` takes `{"query": "...", "k": 2}` and answers with the
//! matched rows; `GET /health` is a liveness probe. Errors become
//! `{"error": ..., "code": ...}` with status 400 for a blank query or an
//! undecodable body and 500 for everything else.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::SearchService;
use crate::error::SearchError;
use crate::io::{ErrorResponse, QueryResponse};

/// Body of `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,

    /// Number of matches; the service default when absent
    #[serde(default)]
    pub k: Option<usize>,
}

/// Build the router over a ready service.
pub fn router(service: Arc<SearchService>) -> Router {
    Router::new()
        .route("/query", post(query_handler))
        .route("/health", get(health_check))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(service)
}

/// Bind `bind` and serve until Ctrl-C.
pub async fn serve(service: Arc<SearchService>, bind: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Serving {} records on http://{}",
        service.len(),
        listener.local_addr()?
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_check() -> &'static str {
    "OK"
}

async fn query_handler(
    State(service): State<Arc<SearchService>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected query body: {rejection}");
            return error_response(&SearchError::MalformedRequest {
                reason: rejection.body_text(),
            });
        }
    };

    let text = request.query.unwrap_or_default();
    let k = request.k.unwrap_or_else(|| service.default_k());

    match service.query(&text, k).await {
        Ok(matches) => Json(QueryResponse::from_matches(&matches)).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(error: &SearchError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::warn!("Query failed: {error}");
    }
    (status, Json(ErrorResponse::from(error))).into_response()
}
