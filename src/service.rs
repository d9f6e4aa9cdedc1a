//! The chat service surface.
//!
//! [`ChatService`] is what an HTTP layer (or a REPL, or a test) talks
//! to: hand it a [`ChatRequest`], get back an [`AnswerStream`] that
//! yields the answer chunk by chunk. Each turn runs on its own spawned
//! task under a supervisor, so a panic inside the pipeline is contained
//! to that turn and surfaces as the apology instead of tearing the
//! service down.

use std::sync::Arc;

use futures_util::Stream;
use uuid::Uuid;

use crate::clients::{
    Attachment, GenerationError, HttpEmbeddingClient, HttpGenerationClient, HttpRetrievalClient,
    RelevancePolicy,
};
use crate::config::PipelineConfig;
use crate::pipeline::{TurnPipeline, TurnRequest, APOLOGY_ANSWER};
use crate::store::{ContextStore, SqliteContextStore, StorageError};
use crate::stream::{ChannelSink, StreamOptions};
use crate::summary::SummaryPolicy;

/// One inbound chat message. A missing session identifier starts a new
/// session.
#[derive(Clone, Debug, Default)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
    pub attachment: Option<Attachment>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            session_id: None,
            message: message.into(),
            attachment: None,
        }
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// The chunk-wise answer to one chat turn.
///
/// Dropping the stream mid-answer aborts emission on the pipeline side
/// without raising an error there.
pub struct AnswerStream {
    session_id: String,
    rx: flume::Receiver<String>,
}

impl AnswerStream {
    /// The session this answer belongs to (freshly minted when the
    /// request carried none).
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The next chunk, or `None` once the answer is complete.
    pub async fn next_chunk(&self) -> Option<String> {
        self.rx.recv_async().await.ok()
    }

    /// Drains the stream and returns the full answer.
    pub async fn collect(self) -> String {
        let mut answer = String::new();
        while let Ok(chunk) = self.rx.recv_async().await {
            answer.push_str(&chunk);
        }
        answer
    }

    /// Adapts the remaining chunks into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = String> {
        self.rx.into_stream()
    }
}

/// Entry point for chat turns. Cheap to clone and safe to share across
/// concurrent callers; per-turn state never crosses requests.
#[derive(Clone)]
pub struct ChatService {
    pipeline: TurnPipeline,
}

impl ChatService {
    #[must_use]
    pub fn new(pipeline: TurnPipeline) -> Self {
        Self { pipeline }
    }

    /// Wires the full HTTP-and-SQLite stack from a configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        let store = SqliteContextStore::new(&config.database_url);
        let policy = RelevancePolicy {
            top_k: config.top_k,
            distance_threshold: config.distance_threshold,
        };
        let mut options = StreamOptions::default();
        if let Some(delay) = config.char_delay {
            options = options.with_char_delay(delay);
        }
        let pipeline = TurnPipeline::new(
            Arc::new(store),
            Arc::new(HttpEmbeddingClient::new(&config.embedding_url)),
            Arc::new(HttpRetrievalClient::new(&config.retrieval_url, policy)),
            Arc::new(HttpGenerationClient::new(
                &config.generation_url,
                config.generation_timeout,
            )),
        )
        .with_generation_timeout(config.generation_timeout)
        .with_summary_policy(SummaryPolicy {
            window: config.summary_window,
        })
        .with_stream_options(options);
        Self { pipeline }
    }

    /// Starts one chat turn and returns its answer stream immediately.
    ///
    /// The turn runs on its own task. If that task panics, the
    /// supervisor emits the apology into the stream so the caller always
    /// receives an answer.
    pub fn chat(&self, request: ChatRequest) -> AnswerStream {
        let session_id = request
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut turn = TurnRequest::new(session_id.clone(), request.message);
        if let Some(attachment) = request.attachment {
            turn = turn.with_attachment(attachment);
        }

        let (tx, rx) = flume::unbounded();
        let pipeline = self.pipeline.clone();
        let supervisor_tx = tx.clone();
        tokio::spawn(async move {
            let worker = tokio::spawn(async move {
                let mut sink = ChannelSink::new(tx);
                pipeline.run_turn(turn, &mut sink).await
            });
            if let Err(join_error) = worker.await {
                tracing::error!(%join_error, "turn task panicked; emitting apology");
                emit_apology(&supervisor_tx).await;
            }
        });

        AnswerStream { session_id, rx }
    }

    /// Folds a previous summary and new dialogue into a fresh summary.
    ///
    /// # Errors
    ///
    /// Propagates the generation failure unchanged.
    pub async fn summarize(
        &self,
        previous_summary: &str,
        new_dialogue: &str,
    ) -> Result<String, GenerationError> {
        self.pipeline.summarize(previous_summary, new_dialogue).await
    }

    /// Forces a rolling-summary refresh for a session.
    pub async fn refresh_summary(&self, session_id: &str) {
        self.pipeline.refresh_summary(session_id).await;
    }

    /// Administrative wipe of all persisted context.
    ///
    /// # Errors
    ///
    /// Propagates the store failure; nothing is deleted partially.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.pipeline.store().clear_all().await
    }

    /// The underlying context store, for read access in admin surfaces.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ContextStore> {
        self.pipeline.store()
    }
}

async fn emit_apology(tx: &flume::Sender<String>) {
    let mut buf = [0u8; 4];
    for c in APOLOGY_ANSWER.chars() {
        if tx.send_async(c.encode_utf8(&mut buf).to_string()).await.is_err() {
            return;
        }
    }
}
