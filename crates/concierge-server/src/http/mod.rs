mod routes;

pub use routes::create_router;

use crate::engine::{Engine, SharedStore};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use concierge_core::{AnswerEngine, ConciergeError};
use serde::Serialize;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn AnswerEngine>,
    pub store: Arc<SharedStore>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: engine.answer,
            store: engine.store,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Error body: `{"success": false, "error": "..."}`
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

/// Custom error type for HTTP handlers
pub struct AppError(ConciergeError);

pub fn status_for(err: &ConciergeError) -> StatusCode {
    match err {
        ConciergeError::BadInput(_) => StatusCode::BAD_REQUEST,
        ConciergeError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        ConciergeError::UpstreamTimeout | ConciergeError::CompletionTimeout => {
            StatusCode::GATEWAY_TIMEOUT
        }
        ConciergeError::RateLimited => StatusCode::SERVICE_UNAVAILABLE,
        ConciergeError::Upstream(_)
        | ConciergeError::NotConfigured
        | ConciergeError::Auth
        | ConciergeError::Completion(_)
        | ConciergeError::Validation(_)
        | ConciergeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::warn!(code = self.0.code(), "request failed: {}", self.0);
        }
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

impl From<ConciergeError> for AppError {
    fn from(err: ConciergeError) -> Self {
        Self(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;
