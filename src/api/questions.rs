//! Question API endpoints
//!
//! Submission is anonymous; listing for the owner and moderation verdicts
//! carry the session password and are re-authenticated on every request.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{ApiError, AppState};
use crate::models::{Question, QuestionStatus};

/// Request body for submitting a question
#[derive(Debug, Deserialize)]
pub struct SubmitQuestionRequest {
    pub question: Option<String>,
}

/// Response for a submitted question
#[derive(Debug, Serialize)]
pub struct SubmitQuestionResponse {
    pub id: i64,
    pub status: String,
}

/// Query parameters for the owner's question list
#[derive(Debug, Deserialize)]
pub struct OwnerListQuery {
    pub password: Option<String>,
}

/// Request body for approve/reject
#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub password: Option<String>,
}

/// Owner view of a question: full state, any status
#[derive(Debug, Serialize)]
pub struct OwnerQuestionResponse {
    pub id: i64,
    pub text: String,
    pub status: String,
    pub created_at: String,
}

impl From<Question> for OwnerQuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            text: question.body,
            status: question.status.to_string(),
            created_at: question.created_at.to_rfc3339(),
        }
    }
}

/// Public view of a question: approved text only, no ids, no status
#[derive(Debug, Serialize)]
pub struct PublicQuestionResponse {
    pub text: String,
    pub created_at: String,
}

impl From<Question> for PublicQuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            text: question.body,
            created_at: question.created_at.to_rfc3339(),
        }
    }
}

/// Submit an anonymous question to a session
pub async fn submit_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitQuestionRequest>,
) -> impl IntoResponse {
    let text = req.question.unwrap_or_default();

    match state.moderation.submit(&session_id, &text).await {
        Ok(question) => {
            let response = SubmitQuestionResponse {
                id: question.id,
                status: question.status.to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// List every question of a session for its owner
pub async fn list_owner_questions(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<OwnerListQuery>,
) -> impl IntoResponse {
    let Some(password) = query.password.filter(|p| !p.trim().is_empty()) else {
        return ApiError::validation_error("password is required").into_response();
    };

    match state.moderation.list_for_owner(&session_id, &password).await {
        Ok(questions) => {
            let questions: Vec<OwnerQuestionResponse> =
                questions.into_iter().map(Into::into).collect();
            Json(serde_json::json!({ "questions": questions })).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// List the approved questions of a session
pub async fn list_public_questions(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.moderation.list_public(&session_id).await {
        Ok(questions) => {
            let questions: Vec<PublicQuestionResponse> =
                questions.into_iter().map(Into::into).collect();
            Json(serde_json::json!({ "questions": questions })).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Approve a pending question
pub async fn approve_question(
    State(state): State<AppState>,
    Path((session_id, question_id)): Path<(String, i64)>,
    Json(req): Json<ModerateRequest>,
) -> Response {
    moderate(state, session_id, question_id, req.password, QuestionStatus::Approved).await
}

/// Reject a pending question
pub async fn reject_question(
    State(state): State<AppState>,
    Path((session_id, question_id)): Path<(String, i64)>,
    Json(req): Json<ModerateRequest>,
) -> Response {
    moderate(state, session_id, question_id, req.password, QuestionStatus::Rejected).await
}

async fn moderate(
    state: AppState,
    session_id: String,
    question_id: i64,
    password: Option<String>,
    verdict: QuestionStatus,
) -> Response {
    let Some(password) = password.filter(|p| !p.trim().is_empty()) else {
        return ApiError::validation_error("password is required").into_response();
    };

    let result = match verdict {
        QuestionStatus::Approved => {
            state
                .moderation
                .approve(&session_id, &password, question_id)
                .await
        }
        _ => {
            state
                .moderation
                .reject(&session_id, &password, question_id)
                .await
        }
    };

    match result {
        Ok(()) => {
            let message = format!("question {}", verdict);
            Json(serde_json::json!({ "message": message })).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
