// src/api/actions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::AppState;

pub async fn list_actions_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "actions": state.session.registry.descriptors() }))
}

/// Runs an action. Failures inside the action are reported in the envelope
/// with a 200; only an unknown action name is a 404.
pub async fn invoke_action_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let args = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let session = &state.session;
    match session
        .registry
        .invoke(session.context.clone(), &name, args)
        .await
    {
        Some(outcome) => (StatusCode::OK, Json(json!(outcome))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Unknown action: {}", name) })),
        ),
    }
}
