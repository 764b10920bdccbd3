//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use pulse_store::StoreError;
use pulse_tracker::TrackerError;

/// Errors surfaced by REST handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Storage failure behind a read endpoint.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Registry operation failure.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Tracker(TrackerError::NotTracked(_)) => StatusCode::NOT_FOUND,
            Self::Tracker(TrackerError::AlreadyTracked(_)) => StatusCode::CONFLICT,
            Self::Tracker(TrackerError::NotOnNetwork(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Tracker(TrackerError::Protocol(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
