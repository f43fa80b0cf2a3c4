//! # API Module
//!
//! HTTP surface of the server. Everything lives under `/api`:
//!
//! - `GET /api/health` - liveness plus the number of registered actions
//! - `GET /api/actions` - action descriptors (name, description, input schema)
//! - `POST /api/actions/:name` - runs an action; the body is its arguments
//! - `POST /api/rpc` - the MCP JSON-RPC handler over HTTP

pub mod actions;
pub mod health;
pub mod rpc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/actions", get(actions::list_actions_handler))
        .route("/actions/:name", post(actions::invoke_action_handler))
        .route("/rpc", post(rpc::rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
