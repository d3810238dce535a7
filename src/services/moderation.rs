//! Moderation engine
//!
//! Transport-independent business logic for Q&A sessions: submission
//! validation, per-request credential verification, and the question status
//! state machine (pending → approved | rejected, both terminal).
//!
//! There are no session tokens. Every owner operation re-verifies the
//! supplied password against the stored credential hash.

use std::sync::Arc;

use crate::db::repositories::{QuestionRepository, SessionRepository};
use crate::models::{QaSession, Question, QuestionStatus};
use crate::services::password::{hash_password, verify_password};

/// Longest accepted question body, in characters
pub const MAX_QUESTION_LEN: usize = 2000;

/// Error types for moderation engine operations
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    /// A required field is missing or malformed (client fault, no retry)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown session, or question absent / owned elsewhere / not pending
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Password does not match the session credential
    #[error("Invalid password")]
    Unauthorized,

    /// Storage or hashing failure
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Moderation engine for Q&A sessions
///
/// Consumes the store through injected repositories and exposes the decision
/// functions the request-handling shell calls into.
pub struct ModerationService {
    sessions: Arc<dyn SessionRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl ModerationService {
    /// Create a new moderation service with the given repositories
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self { sessions, questions }
    }

    /// Create a new Q&A session protected by `password`.
    ///
    /// The password is hashed before it reaches the store; the plaintext is
    /// never persisted.
    pub async fn create_session(&self, password: &str) -> Result<QaSession, ModerationError> {
        if password.trim().is_empty() {
            return Err(ModerationError::Validation("password is required".into()));
        }

        let password_hash = hash_password(password)?;
        let session = self.sessions.create(&password_hash).await?;

        tracing::info!(session_id = %session.id, "Q&A session created");
        Ok(session)
    }

    /// Submit an anonymous question to a session.
    ///
    /// The question starts out `pending` and stays invisible to the public
    /// until the owner approves it.
    pub async fn submit(&self, session_id: &str, body: &str) -> Result<Question, ModerationError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ModerationError::Validation("question text is required".into()));
        }
        if body.chars().count() > MAX_QUESTION_LEN {
            return Err(ModerationError::Validation(format!(
                "question text must be at most {} characters",
                MAX_QUESTION_LEN
            )));
        }

        if !self.sessions.exists(session_id).await? {
            return Err(ModerationError::NotFound("session"));
        }

        Ok(self.questions.create(session_id, body).await?)
    }

    /// Verify the owner password for a session.
    ///
    /// Gates every owner-only operation and is re-run on each request.
    pub async fn authenticate(
        &self,
        session_id: &str,
        password: &str,
    ) -> Result<(), ModerationError> {
        let hash = self
            .sessions
            .credential_hash(session_id)
            .await?
            .ok_or(ModerationError::NotFound("session"))?;

        if verify_password(password, &hash)? {
            Ok(())
        } else {
            Err(ModerationError::Unauthorized)
        }
    }

    /// List every question of a session for its owner, newest first.
    pub async fn list_for_owner(
        &self,
        session_id: &str,
        password: &str,
    ) -> Result<Vec<Question>, ModerationError> {
        self.authenticate(session_id, password).await?;
        Ok(self.questions.list(session_id, None).await?)
    }

    /// List the approved questions of a session, newest first.
    ///
    /// No authentication; pending and rejected questions are filtered in the
    /// store query and never reach the caller. An unknown session simply
    /// yields an empty list.
    pub async fn list_public(&self, session_id: &str) -> Result<Vec<Question>, ModerationError> {
        Ok(self
            .questions
            .list(session_id, Some(QuestionStatus::Approved))
            .await?)
    }

    /// Approve a pending question.
    pub async fn approve(
        &self,
        session_id: &str,
        password: &str,
        question_id: i64,
    ) -> Result<(), ModerationError> {
        self.moderate(session_id, password, question_id, QuestionStatus::Approved)
            .await
    }

    /// Reject a pending question.
    pub async fn reject(
        &self,
        session_id: &str,
        password: &str,
        question_id: i64,
    ) -> Result<(), ModerationError> {
        self.moderate(session_id, password, question_id, QuestionStatus::Rejected)
            .await
    }

    async fn moderate(
        &self,
        session_id: &str,
        password: &str,
        question_id: i64,
        verdict: QuestionStatus,
    ) -> Result<(), ModerationError> {
        self.authenticate(session_id, password).await?;

        // The pending check and the write are one conditional UPDATE in the
        // store. A question that is missing, owned by another session, or no
        // longer pending all surface as the same NotFound.
        let updated = self
            .questions
            .set_status_if_pending(question_id, session_id, verdict)
            .await?;

        if updated {
            tracing::info!(session_id, question_id, status = %verdict, "Question moderated");
            Ok(())
        } else {
            Err(ModerationError::NotFound("pending question"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, DatabaseDriver};
    use crate::db::repositories::{SqlxQuestionRepository, SqlxSessionRepository};
    use crate::db::{create_pool, create_test_pool, migrations, DynDatabasePool};

    async fn service_on(pool: DynDatabasePool) -> ModerationService {
        migrations::run_migrations(&pool).await.unwrap();
        ModerationService::new(
            SqlxSessionRepository::boxed(pool.clone()),
            SqlxQuestionRepository::boxed(pool),
        )
    }

    async fn service() -> ModerationService {
        service_on(create_test_pool().await.unwrap()).await
    }

    #[tokio::test]
    async fn create_session_rejects_empty_password() {
        let service = service().await;

        let err = service.create_session("").await.unwrap_err();
        assert!(matches!(err, ModerationError::Validation(_)));

        let err = service.create_session("   ").await.unwrap_err();
        assert!(matches!(err, ModerationError::Validation(_)));
    }

    #[tokio::test]
    async fn create_session_does_not_store_the_plaintext() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();

        assert!(!session.password_hash.contains("secret123"));
        assert!(session.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn authenticate_succeeds_iff_password_matches() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();

        service.authenticate(&session.id, "secret123").await.unwrap();

        let err = service.authenticate(&session.id, "wrong").await.unwrap_err();
        assert!(matches!(err, ModerationError::Unauthorized));

        let err = service.authenticate("no-such-session", "secret123").await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
    }

    #[tokio::test]
    async fn submit_requires_nonempty_text() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();

        for text in ["", "   ", "\n\t"] {
            let err = service.submit(&session.id, text).await.unwrap_err();
            assert!(matches!(err, ModerationError::Validation(_)));
        }

        // Nothing was created
        let questions = service.list_for_owner(&session.id, "secret123").await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_overlong_text() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();

        let long = "x".repeat(MAX_QUESTION_LEN + 1);
        let err = service.submit(&session.id, &long).await.unwrap_err();
        assert!(matches!(err, ModerationError::Validation(_)));

        let questions = service.list_for_owner(&session.id, "secret123").await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn submit_to_unknown_session_is_not_found() {
        let service = service().await;
        let err = service.submit("no-such-session", "What time?").await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
    }

    #[tokio::test]
    async fn full_moderation_flow() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();

        let question = service.submit(&session.id, "What time?").await.unwrap();
        assert_eq!(question.status, QuestionStatus::Pending);

        // Owner sees the pending question, the public does not
        let owner_view = service.list_for_owner(&session.id, "secret123").await.unwrap();
        assert_eq!(owner_view.len(), 1);
        assert_eq!(owner_view[0].status, QuestionStatus::Pending);
        assert!(service.list_public(&session.id).await.unwrap().is_empty());

        service.approve(&session.id, "secret123", question.id).await.unwrap();

        let public_view = service.list_public(&session.id).await.unwrap();
        assert_eq!(public_view.len(), 1);
        assert_eq!(public_view[0].body, "What time?");
        assert_eq!(public_view[0].created_at, question.created_at);

        let owner_view = service.list_for_owner(&session.id, "secret123").await.unwrap();
        assert_eq!(owner_view[0].status, QuestionStatus::Approved);
    }

    #[tokio::test]
    async fn status_transitions_exactly_once() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();
        let question = service.submit(&session.id, "once?").await.unwrap();

        service.approve(&session.id, "secret123", question.id).await.unwrap();

        // A second approve and a late reject both fail, and the first
        // verdict stands.
        let err = service
            .approve(&session.id, "secret123", question.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));

        let err = service
            .reject(&session.id, "secret123", question.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));

        let owner_view = service.list_for_owner(&session.id, "secret123").await.unwrap();
        assert_eq!(owner_view[0].status, QuestionStatus::Approved);
    }

    #[tokio::test]
    async fn rejected_questions_never_go_public() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();

        let keep = service.submit(&session.id, "keep me").await.unwrap();
        let hide = service.submit(&session.id, "drop me").await.unwrap();
        service.submit(&session.id, "still pending").await.unwrap();

        service.approve(&session.id, "secret123", keep.id).await.unwrap();
        service.reject(&session.id, "secret123", hide.id).await.unwrap();

        let public_view = service.list_public(&session.id).await.unwrap();
        assert_eq!(public_view.len(), 1);
        assert_eq!(public_view[0].body, "keep me");
    }

    #[tokio::test]
    async fn moderation_requires_the_owner_password() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();
        let question = service.submit(&session.id, "What time?").await.unwrap();

        let err = service
            .approve(&session.id, "wrong", question.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::Unauthorized));

        // Still pending
        let owner_view = service.list_for_owner(&session.id, "secret123").await.unwrap();
        assert_eq!(owner_view[0].status, QuestionStatus::Pending);
    }

    #[tokio::test]
    async fn question_ids_do_not_cross_sessions() {
        let service = service().await;
        let mine = service.create_session("secret123").await.unwrap();
        let theirs = service.create_session("other-pass").await.unwrap();

        let question = service.submit(&mine.id, "cross?").await.unwrap();

        let err = service
            .approve(&theirs.id, "other-pass", question.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));

        let owner_view = service.list_for_owner(&mine.id, "secret123").await.unwrap();
        assert_eq!(owner_view[0].status, QuestionStatus::Pending);
    }

    #[tokio::test]
    async fn public_list_of_unknown_session_is_empty() {
        let service = service().await;
        let questions = service.list_public("no-such-session").await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn owner_list_is_newest_first() {
        let service = service().await;
        let session = service.create_session("secret123").await.unwrap();

        let first = service.submit(&session.id, "first").await.unwrap();
        let second = service.submit(&session.id, "second").await.unwrap();

        let owner_view = service.list_for_owner(&session.id, "secret123").await.unwrap();
        let ids: Vec<i64> = owner_view.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn concurrent_moderation_has_exactly_one_winner() {
        // File-backed database so the two calls really use separate
        // connections; the in-memory test pool is capped at one.
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: dir.path().join("askbox.db").to_string_lossy().to_string(),
        };
        let pool = create_pool(&config).await.unwrap();
        let service = service_on(pool).await;

        let session = service.create_session("secret123").await.unwrap();
        let question = service.submit(&session.id, "race me").await.unwrap();

        let (approve, reject) = tokio::join!(
            service.approve(&session.id, "secret123", question.id),
            service.reject(&session.id, "secret123", question.id),
        );

        // Exactly one side wins; the loser sees NotFound, not a crash and
        // not a second transition.
        let approve_won = approve.is_ok();
        assert_ne!(approve_won, reject.is_ok());
        let loser = if approve_won { reject } else { approve };
        assert!(matches!(loser.unwrap_err(), ModerationError::NotFound(_)));

        let owner_view = service.list_for_owner(&session.id, "secret123").await.unwrap();
        let expected = if approve_won {
            QuestionStatus::Approved
        } else {
            QuestionStatus::Rejected
        };
        assert_eq!(owner_view[0].status, expected);
    }
}
