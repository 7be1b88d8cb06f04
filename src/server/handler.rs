use crate::ports::SearchServicePort;
use crate::Error;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, instrument, warn};

/// Query string of `GET /api/v1/search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Clone)]
struct AppState {
    search: Arc<dyn SearchServicePort>,
}

/// HTTP routes for the search service.
///
/// - `GET /api/v1/search?query=<phrase>`: grouped offers
/// - `GET /health`: liveness
///
/// Other methods on these paths get `405 Method Not Allowed`. A panic while
/// handling a request is answered with the same opaque 500 as any other
/// internal failure.
pub fn router(search: Arc<dyn SearchServicePort>) -> Router {
    Router::new()
        .route("/api/v1/search", get(search_handler))
        .route("/health", get(health_handler))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { search })
}

#[instrument(skip(state))]
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(query) = params.query.filter(|q| !q.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing query parameter");
    };

    match state.search.search(&query).await {
        Ok(result) => Json(result).into_response(),
        Err(e) if e.is_client_error() => {
            warn!("Rejected search request: {}", e);
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e) => {
            error!("Search failed: {}", e);
            internal_error()
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());

    error!("Search failed: {}", Error::Internal(format!("handler panicked: {detail}")));
    internal_error()
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
