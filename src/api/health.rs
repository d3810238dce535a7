//! Health check endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::api::common::AppState;

/// GET /api/v1/health - Service health plus the stored session count.
///
/// The count doubles as a liveness probe of the database connection.
pub async fn get_health(State(state): State<AppState>) -> impl IntoResponse {
    match state.sessions.count().await {
        Ok(count) => Json(serde_json::json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "sessions": count,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "status": "unhealthy" })),
            )
                .into_response()
        }
    }
}
