//! REST endpoints and router assembly.

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use pulse_analytics::{AnalyticsConfig, analyze, parse_range};
use pulse_core::types::{AnalysisResult, ContactAddress, Metric};

use crate::errors::ServerError;
use crate::state::AppState;
use crate::websocket::ws_handler;

/// Assemble the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/history/{contact}", get(history))
        .route("/api/analysis/{contact}", get(analysis))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    range: Option<String>,
}

/// `GET /api/history/{contact}?range=24h` — raw metrics over the trailing
/// window, timestamp ascending. Unknown contacts yield an empty array, not
/// an error: history is a pure read over whatever the store holds.
async fn history(
    State(state): State<AppState>,
    Path(contact): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<Metric>>, ServerError> {
    let window = parse_range(query.range.as_deref(), state.default_range);
    let contact = ContactAddress::new(contact);
    let metrics = state.store.trailing(&contact, window)?;
    Ok(Json(metrics))
}

/// `GET /api/analysis/{contact}?range=24h` — derived statistics over the
/// trailing window.
async fn analysis(
    State(state): State<AppState>,
    Path(contact): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<AnalysisResult>, ServerError> {
    let window = parse_range(query.range.as_deref(), state.default_range);
    let contact = ContactAddress::new(contact);
    let metrics = state.store.trailing(&contact, window)?;
    let config = AnalyticsConfig {
        gap_threshold: state.gap_threshold,
    };
    Ok(Json(analyze(&metrics, &config)))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "connected": state.supervisor.is_connected(),
        "trackers": state.registry.snapshot().len(),
        "wsClients": state.broadcast.connection_count(),
    }))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
