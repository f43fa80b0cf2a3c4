use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "actions": state.session.registry.len(),
        "localWallet": state.session.context.signer.is_some(),
    }))
}
