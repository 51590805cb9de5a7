use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Notes API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "profile": "/api/profile (protected)",
            "notes": "/api/notes[/:id] (protected)",
        }
    }))
}

/// GET /health - Liveness plus storage connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.backend.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "storage": state.backend.name(),
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "msg": "storage unavailable",
                    "status": "degraded",
                    "timestamp": now,
                    "storage": state.backend.name(),
                })),
            )
        }
    }
}
