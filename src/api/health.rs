use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::AppState;

pub const SERVICE_NAME: &str = "YT Music API";

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "message": format!("{} is running", SERVICE_NAME),
        "cache": state.resolver.cache().stats(),
    }))
}
