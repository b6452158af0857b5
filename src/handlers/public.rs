use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// GET / - service information
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "CRM access gate",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "session": "/api/session (Authorization token)",
                "pages": "role-scoped dashboards, guarded by the `token` cookie"
            }
        }
    }))
}

/// GET /health - liveness probe
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "status": "ok",
                "timestamp": chrono::Utc::now()
            }
        })),
    )
}
