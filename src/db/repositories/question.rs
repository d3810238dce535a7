//! Question repository
//!
//! This module provides:
//! - `QuestionRepository` trait defining the store contract for questions
//! - `SqlxQuestionRepository` implementing the trait for SQLite and MySQL
//!
//! Every lookup and mutation is scoped to the owning session; a question id
//! on its own never crosses sessions.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Question, QuestionStatus};

/// Question repository trait
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Create a new question in `pending` with a server-assigned timestamp
    async fn create(&self, session_id: &str, body: &str) -> Result<Question>;

    /// Get a question by id within its owning session
    async fn get(&self, id: i64, session_id: &str) -> Result<Option<Question>>;

    /// List a session's questions, optionally filtered by status,
    /// newest first
    async fn list(
        &self,
        session_id: &str,
        status: Option<QuestionStatus>,
    ) -> Result<Vec<Question>>;

    /// Conditionally move a question out of `pending`.
    ///
    /// The guard (right id, right session, status still `pending`) and the
    /// status write are a single UPDATE, so two racing callers cannot both
    /// win. Returns whether a row was updated.
    async fn set_status_if_pending(
        &self,
        id: i64,
        session_id: &str,
        status: QuestionStatus,
    ) -> Result<bool>;
}

/// SQLx-based question repository implementation
pub struct SqlxQuestionRepository {
    pool: DynDatabasePool,
}

impl SqlxQuestionRepository {
    /// Create a new SQLx question repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn QuestionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl QuestionRepository for SqlxQuestionRepository {
    async fn create(&self, session_id: &str, body: &str) -> Result<Question> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_question_sqlite(self.pool.as_sqlite().unwrap(), session_id, body).await
            }
            DatabaseDriver::Mysql => {
                create_question_mysql(self.pool.as_mysql().unwrap(), session_id, body).await
            }
        }
    }

    async fn get(&self, id: i64, session_id: &str) -> Result<Option<Question>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_question_sqlite(self.pool.as_sqlite().unwrap(), id, session_id).await
            }
            DatabaseDriver::Mysql => {
                get_question_mysql(self.pool.as_mysql().unwrap(), id, session_id).await
            }
        }
    }

    async fn list(
        &self,
        session_id: &str,
        status: Option<QuestionStatus>,
    ) -> Result<Vec<Question>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_questions_sqlite(self.pool.as_sqlite().unwrap(), session_id, status).await
            }
            DatabaseDriver::Mysql => {
                list_questions_mysql(self.pool.as_mysql().unwrap(), session_id, status).await
            }
        }
    }

    async fn set_status_if_pending(
        &self,
        id: i64,
        session_id: &str,
        status: QuestionStatus,
    ) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_status_if_pending_sqlite(self.pool.as_sqlite().unwrap(), id, session_id, status)
                    .await
            }
            DatabaseDriver::Mysql => {
                set_status_if_pending_mysql(self.pool.as_mysql().unwrap(), id, session_id, status)
                    .await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_question_sqlite(
    pool: &SqlitePool,
    session_id: &str,
    body: &str,
) -> Result<Question> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO questions (session_id, body, status, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(body)
    .bind(QuestionStatus::Pending.to_string())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to insert question")?;

    Ok(Question {
        id: result.last_insert_rowid(),
        session_id: session_id.to_string(),
        body: body.to_string(),
        status: QuestionStatus::Pending,
        created_at: now,
    })
}

async fn get_question_sqlite(
    pool: &SqlitePool,
    id: i64,
    session_id: &str,
) -> Result<Option<Question>> {
    let row = sqlx::query(
        "SELECT id, session_id, body, status, created_at FROM questions
         WHERE id = ? AND session_id = ?",
    )
    .bind(id)
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch question")?;

    Ok(row.map(|r| question_from_parts(
        r.get("id"),
        r.get("session_id"),
        r.get("body"),
        r.get::<String, _>("status"),
        r.get("created_at"),
    )))
}

async fn list_questions_sqlite(
    pool: &SqlitePool,
    session_id: &str,
    status: Option<QuestionStatus>,
) -> Result<Vec<Question>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(
                "SELECT id, session_id, body, status, created_at FROM questions
                 WHERE session_id = ? AND status = ?
                 ORDER BY created_at DESC, id DESC",
            )
            .bind(session_id)
            .bind(status.to_string())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(
                "SELECT id, session_id, body, status, created_at FROM questions
                 WHERE session_id = ?
                 ORDER BY created_at DESC, id DESC",
            )
            .bind(session_id)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list questions")?;

    Ok(rows
        .into_iter()
        .map(|r| question_from_parts(
            r.get("id"),
            r.get("session_id"),
            r.get("body"),
            r.get::<String, _>("status"),
            r.get("created_at"),
        ))
        .collect())
}

async fn set_status_if_pending_sqlite(
    pool: &SqlitePool,
    id: i64,
    session_id: &str,
    status: QuestionStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE questions SET status = ?
         WHERE id = ? AND session_id = ? AND status = 'pending'",
    )
    .bind(status.to_string())
    .bind(id)
    .bind(session_id)
    .execute(pool)
    .await
    .context("Failed to update question status")?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_question_mysql(
    pool: &MySqlPool,
    session_id: &str,
    body: &str,
) -> Result<Question> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO questions (session_id, body, status, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(body)
    .bind(QuestionStatus::Pending.to_string())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to insert question")?;

    Ok(Question {
        id: result.last_insert_id() as i64,
        session_id: session_id.to_string(),
        body: body.to_string(),
        status: QuestionStatus::Pending,
        created_at: now,
    })
}

async fn get_question_mysql(
    pool: &MySqlPool,
    id: i64,
    session_id: &str,
) -> Result<Option<Question>> {
    let row = sqlx::query(
        "SELECT id, session_id, body, status, created_at FROM questions
         WHERE id = ? AND session_id = ?",
    )
    .bind(id)
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch question")?;

    Ok(row.map(|r| question_from_parts(
        r.get("id"),
        r.get("session_id"),
        r.get("body"),
        r.get::<String, _>("status"),
        r.get("created_at"),
    )))
}

async fn list_questions_mysql(
    pool: &MySqlPool,
    session_id: &str,
    status: Option<QuestionStatus>,
) -> Result<Vec<Question>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(
                "SELECT id, session_id, body, status, created_at FROM questions
                 WHERE session_id = ? AND status = ?
                 ORDER BY created_at DESC, id DESC",
            )
            .bind(session_id)
            .bind(status.to_string())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(
                "SELECT id, session_id, body, status, created_at FROM questions
                 WHERE session_id = ?
                 ORDER BY created_at DESC, id DESC",
            )
            .bind(session_id)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list questions")?;

    Ok(rows
        .into_iter()
        .map(|r| question_from_parts(
            r.get("id"),
            r.get("session_id"),
            r.get("body"),
            r.get::<String, _>("status"),
            r.get("created_at"),
        ))
        .collect())
}

async fn set_status_if_pending_mysql(
    pool: &MySqlPool,
    id: i64,
    session_id: &str,
    status: QuestionStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE questions SET status = ?
         WHERE id = ? AND session_id = ? AND status = 'pending'",
    )
    .bind(status.to_string())
    .bind(id)
    .bind(session_id)
    .execute(pool)
    .await
    .context("Failed to update question status")?;

    Ok(result.rows_affected() > 0)
}

fn question_from_parts(
    id: i64,
    session_id: String,
    body: String,
    status: String,
    created_at: DateTime<Utc>,
) -> Question {
    Question {
        id,
        session_id,
        body,
        status: status.parse().unwrap_or_default(),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SessionRepository, SqlxSessionRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, SqlxQuestionRepository, String) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let sessions = SqlxSessionRepository::new(pool.clone());
        let session = sessions.create("$argon2id$test-hash").await.unwrap();

        (pool.clone(), SqlxQuestionRepository::new(pool), session.id)
    }

    #[tokio::test]
    async fn created_questions_start_pending() {
        let (_pool, repo, session_id) = setup().await;

        let question = repo.create(&session_id, "What time?").await.unwrap();
        assert_eq!(question.status, QuestionStatus::Pending);
        assert_eq!(question.session_id, session_id);

        let stored = repo.get(question.id, &session_id).await.unwrap().unwrap();
        assert_eq!(stored.body, "What time?");
        assert_eq!(stored.status, QuestionStatus::Pending);
        assert_eq!(stored.created_at, question.created_at);
    }

    #[tokio::test]
    async fn get_is_scoped_to_the_owning_session() {
        let (pool, repo, session_id) = setup().await;

        let sessions = SqlxSessionRepository::new(pool);
        let other = sessions.create("$argon2id$other-hash").await.unwrap();

        let question = repo.create(&session_id, "Mine").await.unwrap();
        assert!(repo.get(question.id, &other.id).await.unwrap().is_none());
        assert!(repo.get(question.id, &session_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filters_by_status() {
        let (_pool, repo, session_id) = setup().await;

        let first = repo.create(&session_id, "first").await.unwrap();
        let second = repo.create(&session_id, "second").await.unwrap();
        let third = repo.create(&session_id, "third").await.unwrap();

        let all = repo.list(&session_id, None).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        repo.set_status_if_pending(second.id, &session_id, QuestionStatus::Approved)
            .await
            .unwrap();

        let approved = repo
            .list(&session_id, Some(QuestionStatus::Approved))
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, second.id);

        let pending = repo
            .list(&session_id, Some(QuestionStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn conditional_update_succeeds_exactly_once() {
        let (_pool, repo, session_id) = setup().await;
        let question = repo.create(&session_id, "once").await.unwrap();

        let first = repo
            .set_status_if_pending(question.id, &session_id, QuestionStatus::Approved)
            .await
            .unwrap();
        assert!(first);

        // Already approved: neither a second approve nor a reject may win.
        let again = repo
            .set_status_if_pending(question.id, &session_id, QuestionStatus::Approved)
            .await
            .unwrap();
        let flipped = repo
            .set_status_if_pending(question.id, &session_id, QuestionStatus::Rejected)
            .await
            .unwrap();
        assert!(!again);
        assert!(!flipped);

        let stored = repo.get(question.id, &session_id).await.unwrap().unwrap();
        assert_eq!(stored.status, QuestionStatus::Approved);
    }

    #[tokio::test]
    async fn conditional_update_is_scoped_to_the_owning_session() {
        let (pool, repo, session_id) = setup().await;

        let sessions = SqlxSessionRepository::new(pool);
        let other = sessions.create("$argon2id$other-hash").await.unwrap();

        let question = repo.create(&session_id, "scoped").await.unwrap();
        let crossed = repo
            .set_status_if_pending(question.id, &other.id, QuestionStatus::Approved)
            .await
            .unwrap();
        assert!(!crossed);

        let stored = repo.get(question.id, &session_id).await.unwrap().unwrap();
        assert_eq!(stored.status, QuestionStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_question_id_does_not_update() {
        let (_pool, repo, session_id) = setup().await;
        let updated = repo
            .set_status_if_pending(9999, &session_id, QuestionStatus::Rejected)
            .await
            .unwrap();
        assert!(!updated);
    }
}
