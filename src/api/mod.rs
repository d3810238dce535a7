//! API layer - HTTP handlers and routing
//!
//! This module contains the HTTP shell around the moderation engine:
//! - Session creation
//! - Question submission, owner listing, public listing
//! - Approve/reject moderation verdicts
//! - Health check
//!
//! Handlers extract and validate request shapes, delegate to the engine,
//! and map its error taxonomy onto status codes.

pub mod common;
pub mod health;
pub mod questions;
pub mod sessions;


use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use common::{ApiError, AppState};

/// Build the main API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}/questions",
            get(questions::list_owner_questions).post(questions::submit_question),
        )
        .route(
            "/sessions/{id}/questions/public",
            get(questions::list_public_questions),
        )
        .route(
            "/sessions/{id}/questions/{question_id}/approve",
            post(questions::approve_question),
        )
        .route(
            "/sessions/{id}/questions/{question_id}/reject",
            post(questions::reject_question),
        )
        .route("/health", get(health::get_health))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api/v1", build_api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
