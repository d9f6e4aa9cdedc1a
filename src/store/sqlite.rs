//! SQLite-backed context store.
//!
//! Schema lives in `migrations/` and is applied on first use via
//! `sqlx::migrate!`. The connection pool is initialized lazily behind a
//! one-shot guard, so a store value can be constructed without I/O and
//! shared freely; concurrent first use initializes the pool exactly once.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::OnceCell;
use tracing::instrument;

use super::{ContextStore, QuestionRecord, StorageError};
use crate::message::Message;

/// Context store backed by a SQLite database.
pub struct SqliteContextStore {
    database_url: String,
    pool: OnceCell<SqlitePool>,
}

impl std::fmt::Debug for SqliteContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteContextStore")
            .field("database_url", &self.database_url)
            .finish()
    }
}

impl SqliteContextStore {
    /// Creates a store handle for `database_url` without touching the
    /// database. The pool is opened and migrations are run on first use.
    ///
    /// Example URL: `"sqlite://tutorweave.db"`.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: OnceCell::new(),
        }
    }

    /// Creates a store and eagerly initializes the pool, surfacing
    /// connection or migration failures immediately.
    pub async fn connect(database_url: impl Into<String>) -> Result<Self, StorageError> {
        let store = Self::new(database_url);
        store.pool().await?;
        Ok(store)
    }

    /// One-shot lazy pool initialization.
    async fn pool(&self) -> Result<&SqlitePool, StorageError> {
        self.pool
            .get_or_try_init(|| async {
                let options = SqliteConnectOptions::from_str(&self.database_url)
                    .map_err(|e| StorageError::Backend(format!("connect options: {e}")))?
                    .create_if_missing(true);
                // In-memory SQLite databases are per-connection; a single
                // pooled connection keeps the schema visible to every op.
                let max_connections = if self.database_url.contains(":memory:") {
                    1
                } else {
                    5
                };
                let pool = SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .connect_with(options)
                    .await
                    .map_err(|e| StorageError::Backend(format!("connect: {e}")))?;
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| StorageError::Backend(format!("migration failure: {e}")))?;
                Ok(pool)
            })
            .await
    }
}

#[async_trait]
impl ContextStore for SqliteContextStore {
    #[instrument(skip(self), err)]
    async fn session_exists(&self, session_id: &str) -> Result<bool, StorageError> {
        let pool = self.pool().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE id = ?1")
            .bind(session_id)
            .fetch_one(pool)
            .await
            .map_err(|e| StorageError::Backend(format!("session exists: {e}")))?;
        Ok(count > 0)
    }

    #[instrument(skip(self, created_at), err)]
    async fn create_session(
        &self,
        session_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let pool = self.pool().await?;
        sqlx::query("INSERT OR IGNORE INTO sessions (id, created_at) VALUES (?1, ?2)")
            .bind(session_id)
            .bind(created_at.to_rfc3339())
            .execute(pool)
            .await
            .map_err(|e| StorageError::Backend(format!("create session: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self, message), err)]
    async fn append_turn(&self, session_id: &str, message: &Message) -> Result<(), StorageError> {
        let pool = self.pool().await?;
        sqlx::query(
            "INSERT INTO turns (session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(session_id)
        .bind(&message.role)
        .bind(&message.content)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .map_err(|e| StorageError::Backend(format!("append turn: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn last_question_records(
        &self,
        session_id: &str,
        n: u32,
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        let pool = self.pool().await?;
        let rows = sqlx::query(
            r#"
            SELECT question, answer FROM question_records
            WHERE session_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(session_id)
        .bind(i64::from(n))
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Backend(format!("last question records: {e}")))?;

        // Reverse the descending scan so callers see chronological order.
        let mut records: Vec<QuestionRecord> = rows
            .into_iter()
            .map(|row| QuestionRecord {
                question: row.get("question"),
                answer: row.get("answer"),
            })
            .collect();
        records.reverse();
        Ok(records)
    }

    #[instrument(skip(self), err)]
    async fn total_turns(&self, session_id: &str) -> Result<u64, StorageError> {
        let pool = self.pool().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM turns WHERE session_id = ?1")
            .bind(session_id)
            .fetch_one(pool)
            .await
            .map_err(|e| StorageError::Backend(format!("total turns: {e}")))?;
        Ok(count as u64)
    }

    #[instrument(skip(self, question, answer, embedding), err)]
    async fn save_question_record(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
        embedding: Option<&[f32]>,
    ) -> Result<(), StorageError> {
        let embedding_json = serde_json::to_string(&embedding)?;
        let pool = self.pool().await?;
        sqlx::query(
            r#"
            INSERT INTO question_records (session_id, question, answer, embedding)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(session_id)
        .bind(question)
        .bind(answer)
        .bind(&embedding_json)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Backend(format!("save question record: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn summary(&self, session_id: &str) -> Result<String, StorageError> {
        let pool = self.pool().await?;
        let text: Option<String> =
            sqlx::query_scalar("SELECT summary_text FROM summaries WHERE session_id = ?1")
                .bind(session_id)
                .fetch_optional(pool)
                .await
                .map_err(|e| StorageError::Backend(format!("get summary: {e}")))?;
        Ok(text.unwrap_or_default())
    }

    #[instrument(skip(self, text), err)]
    async fn replace_summary(&self, session_id: &str, text: &str) -> Result<(), StorageError> {
        let pool = self.pool().await?;
        sqlx::query(
            r#"
            INSERT INTO summaries (session_id, summary_text, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(session_id) DO UPDATE SET
                summary_text = excluded.summary_text,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(text)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .map_err(|e| StorageError::Backend(format!("replace summary: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn clear_all(&self) -> Result<(), StorageError> {
        let pool = self.pool().await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| StorageError::Backend(format!("tx begin: {e}")))?;
        for table in ["turns", "question_records", "summaries", "sessions"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Backend(format!("clear {table}: {e}")))?;
        }
        tx.commit()
            .await
            .map_err(|e| StorageError::Backend(format!("tx commit: {e}")))?;
        Ok(())
    }
}
