//! Chat endpoints
//!
//! Errors are answered with the stable `user_message` text; the diagnostic
//! detail only goes to the log.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::agentic::{IntentRouter, RouterResponse};
use crate::error::{DispatchError, RouterError, WeatherError};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

// ============================================================================
// Router
// ============================================================================

/// Build the API router over a shared `IntentRouter`
pub fn create_router_api(router: Arc<IntentRouter>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .with_state(router)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/chat
async fn chat(
    State(router): State<Arc<IntentRouter>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<RouterResponse>, ApiError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    info!(chars = query.len(), "Chat request");
    let response = router.handle(query).await?;
    Ok(Json(response))
}

/// GET /api/health
async fn health(State(router): State<Arc<IntentRouter>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        store: router.dispatcher().store().store_name().to_string(),
    })
}

// ============================================================================
// Errors
// ============================================================================

enum ApiError {
    BadRequest(String),
    Router(RouterError),
}

impl From<RouterError> for ApiError {
    fn from(error: RouterError) -> Self {
        ApiError::Router(error)
    }
}

fn status_for(error: &RouterError) -> StatusCode {
    match error {
        RouterError::AllProvidersExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RouterError::Extract(_) => StatusCode::BAD_GATEWAY,
        RouterError::Dispatch(DispatchError::InsufficientData { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RouterError::Dispatch(DispatchError::StoreUnavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RouterError::Dispatch(DispatchError::IndexRequired(_)) => StatusCode::BAD_REQUEST,
        RouterError::Weather(WeatherError::LocationNotFound { .. }) => StatusCode::NOT_FOUND,
        RouterError::Weather(WeatherError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        RouterError::Dispatch(DispatchError::Store { .. })
        | RouterError::Prompt { .. }
        | RouterError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Router(e) => {
                error!(error = %e, "Query failed");
                (status_for(&e), e.user_message())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
