//! REST API for the intent router
//!
//! ## Endpoints
//!
//! - `POST /api/chat` - answer one query: `{"query": "..."}`
//! - `GET /api/health` - liveness plus store name

mod chat_routes;

pub use chat_routes::{create_router_api, ChatRequest, ErrorResponse, HealthResponse};
