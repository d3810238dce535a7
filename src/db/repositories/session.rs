//! Q&A session repository
//!
//! This module provides:
//! - `SessionRepository` trait defining the store contract for sessions
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::QaSession;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session with a freshly generated id
    async fn create(&self, password_hash: &str) -> Result<QaSession>;

    /// Get the stored credential hash, or None if the session is unknown
    async fn credential_hash(&self, id: &str) -> Result<Option<String>>;

    /// Check whether a session exists
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Number of stored sessions
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, password_hash: &str) -> Result<QaSession> {
        // The id is assigned here, exactly once; it is never reused or
        // updated afterwards.
        let session = QaSession {
            id: Uuid::new_v4().to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                insert_session_sqlite(self.pool.as_sqlite().unwrap(), &session).await?
            }
            DatabaseDriver::Mysql => {
                insert_session_mysql(self.pool.as_mysql().unwrap(), &session).await?
            }
        }

        Ok(session)
    }

    async fn credential_hash(&self, id: &str) -> Result<Option<String>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                credential_hash_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                credential_hash_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => session_exists_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => session_exists_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sessions_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_sessions_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_session_sqlite(pool: &SqlitePool, session: &QaSession) -> Result<()> {
    sqlx::query("INSERT INTO qa_sessions (id, password_hash, created_at) VALUES (?, ?, ?)")
        .bind(&session.id)
        .bind(&session.password_hash)
        .bind(session.created_at)
        .execute(pool)
        .await
        .context("Failed to insert session")?;
    Ok(())
}

async fn credential_hash_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT password_hash FROM qa_sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch session credential")?;
    Ok(row.map(|r| r.get("password_hash")))
}

async fn session_exists_sqlite(pool: &SqlitePool, id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM qa_sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to check session existence")?;
    Ok(row.is_some())
}

async fn count_sessions_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM qa_sessions")
        .fetch_one(pool)
        .await
        .context("Failed to count sessions")?;
    Ok(row.get("n"))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_session_mysql(pool: &MySqlPool, session: &QaSession) -> Result<()> {
    sqlx::query("INSERT INTO qa_sessions (id, password_hash, created_at) VALUES (?, ?, ?)")
        .bind(&session.id)
        .bind(&session.password_hash)
        .bind(session.created_at)
        .execute(pool)
        .await
        .context("Failed to insert session")?;
    Ok(())
}

async fn credential_hash_mysql(pool: &MySqlPool, id: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT password_hash FROM qa_sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch session credential")?;
    Ok(row.map(|r| r.get("password_hash")))
}

async fn session_exists_mysql(pool: &MySqlPool, id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM qa_sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to check session existence")?;
    Ok(row.is_some())
}

async fn count_sessions_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM qa_sessions")
        .fetch_one(pool)
        .await
        .context("Failed to count sessions")?;
    Ok(row.get("n"))
}
