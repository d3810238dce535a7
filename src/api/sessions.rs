//! Session API endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::api::common::{ApiError, AppState};

/// Request body for creating a Q&A session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub password: Option<String>,
}

/// Response for a freshly created session
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: String,
    pub ask_link: String,
    pub view_link: String,
}

/// Create a new Q&A session
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let password = req.password.unwrap_or_default();

    match state.moderation.create_session(&password).await {
        Ok(session) => {
            let response = CreateSessionResponse {
                ask_link: session.ask_link(),
                view_link: session.view_link(),
                id: session.id,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
