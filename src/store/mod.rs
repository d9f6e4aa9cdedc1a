//! The context store: durable session memory behind a narrow contract.
//!
//! The store owns all persisted entities — sessions, append-only turns,
//! rolling summaries, and question records — keyed by session identifier.
//! It is the only cross-request shared resource; each operation is
//! independently atomic and each failure is independently recoverable
//! (callers treat [`StorageError`] as non-fatal to the response).

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use thiserror::Error;

use crate::message::Message;

pub use sqlite::SqliteContextStore;

/// A stored (question, answer) pair from a completed text-path turn.
///
/// Read back when reconstructing recent dialogue for summarization and
/// history windows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question: String,
    pub answer: String,
}

/// Errors raised by context-store operations.
#[derive(Debug, Error, Diagnostic)]
pub enum StorageError {
    /// Database connection or statement failure.
    #[error("storage backend: {0}")]
    #[diagnostic(
        code(tutorweave::storage::backend),
        help("Ensure the database URL is valid and the file is writable.")
    )]
    Backend(String),

    /// A persisted value failed to (de)serialize.
    #[error("storage serialization: {0}")]
    #[diagnostic(code(tutorweave::storage::serde))]
    Serde(#[from] serde_json::Error),
}

/// Durable session memory keyed by session identifier.
///
/// Implementations synchronize their own operations; the pipeline never
/// caches persisted state across requests or adds locking of its own.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Whether a session row exists for `session_id`.
    async fn session_exists(&self, session_id: &str) -> Result<bool, StorageError>;

    /// Creates the session if absent; existing sessions are left untouched.
    async fn create_session(
        &self,
        session_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Appends one immutable turn to the session's history.
    async fn append_turn(&self, session_id: &str, message: &Message) -> Result<(), StorageError>;

    /// The last `n` question records in chronological order.
    async fn last_question_records(
        &self,
        session_id: &str,
        n: u32,
    ) -> Result<Vec<QuestionRecord>, StorageError>;

    /// Total number of turns (user and assistant) persisted for the session.
    async fn total_turns(&self, session_id: &str) -> Result<u64, StorageError>;

    /// Stores a completed (question, answer, embedding) triple. A `None`
    /// embedding (degraded embed stage) is stored as JSON `null`.
    async fn save_question_record(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
        embedding: Option<&[f32]>,
    ) -> Result<(), StorageError>;

    /// The session's rolling summary, or the empty string when none exists.
    async fn summary(&self, session_id: &str) -> Result<String, StorageError>;

    /// Replaces the rolling summary wholesale (last write wins).
    async fn replace_summary(&self, session_id: &str, text: &str) -> Result<(), StorageError>;

    /// Administrative wipe: deletes every record in every table.
    async fn clear_all(&self) -> Result<(), StorageError>;
}
