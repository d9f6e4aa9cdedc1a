//! Turn orchestration.
//!
//! [`TurnPipeline`] drives one inbound message through every stage in
//! order: hydrate session context, classify modality, embed, retrieve,
//! persist the user turn, generate, persist the answer, refresh the
//! rolling summary when due, and stream the result. Stage failures are
//! recorded first-wins and degrade the run; only a generation failure
//! replaces the answer with the fixed apology.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::instrument;

use crate::clients::{
    Attachment, EmbeddingClient, GenerationClient, GenerationError, RetrievalClient,
};
use crate::message::Message;
use crate::normalize::normalize;
use crate::prompt::{self, PromptInputs};
use crate::store::ContextStore;
use crate::stream::{stream_answer, AnswerSink, StreamOptions};
use crate::summary::{self, SummaryPolicy};

use super::errors::PipelineError;
use super::state::{Modality, PreparedContext, TurnState};

/// The answer substituted when generation fails or times out.
pub const APOLOGY_ANSWER: &str = "Sorry, internal error occurred.";

/// Deadline applied to the generate stage when none is configured.
const DEFAULT_GENERATION_DEADLINE: Duration = Duration::from_secs(30);

/// One inbound message, addressed to a session.
#[derive(Clone, Debug)]
pub struct TurnRequest {
    /// Opaque session identifier; created on first use.
    pub session_id: String,
    /// The user's message text, exactly as submitted.
    pub text: String,
    /// Optional attached file; an image attachment switches the turn to
    /// the image path.
    pub attachment: Option<Attachment>,
}

impl TurnRequest {
    #[must_use]
    pub fn new(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            text: text.into(),
            attachment: None,
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// What a completed run produced, degraded or not.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The answer that was streamed (the apology on fatal failure).
    pub answer: String,
    /// Modality the turn was classified as.
    pub modality: Modality,
    /// Whether the full answer reached the sink (`false` when the caller
    /// hung up mid-stream).
    pub delivered: bool,
    /// The first collaborator failure encountered, if any.
    pub error: Option<PipelineError>,
}

impl TurnOutcome {
    /// Whether the answer is the apology rather than generated text.
    #[must_use]
    pub fn is_apology(&self) -> bool {
        self.answer == APOLOGY_ANSWER
    }
}

/// The orchestrator: owns handles to every collaborator and runs turns
/// against them. Cheap to clone; all collaborators sit behind [`Arc`]s.
#[derive(Clone)]
pub struct TurnPipeline {
    store: Arc<dyn ContextStore>,
    embedding: Arc<dyn EmbeddingClient>,
    retrieval: Arc<dyn RetrievalClient>,
    generation: Arc<dyn GenerationClient>,
    generation_deadline: Duration,
    summary_policy: SummaryPolicy,
    stream_options: StreamOptions,
}

impl TurnPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn ContextStore>,
        embedding: Arc<dyn EmbeddingClient>,
        retrieval: Arc<dyn RetrievalClient>,
        generation: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            store,
            embedding,
            retrieval,
            generation,
            generation_deadline: DEFAULT_GENERATION_DEADLINE,
            summary_policy: SummaryPolicy::default(),
            stream_options: StreamOptions::default(),
        }
    }

    /// Bounds the generate stage; elapse counts as a generation failure.
    #[must_use]
    pub fn with_generation_timeout(mut self, deadline: Duration) -> Self {
        self.generation_deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_summary_policy(mut self, policy: SummaryPolicy) -> Self {
        self.summary_policy = policy;
        self
    }

    #[must_use]
    pub fn with_stream_options(mut self, options: StreamOptions) -> Self {
        self.stream_options = options;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    /// Runs one turn end to end and streams the answer into `sink`.
    ///
    /// Never returns an `Err`: every collaborator failure either degrades
    /// the run or swaps in the apology, and the outcome reports which.
    #[instrument(skip(self, request, sink), fields(session = %request.session_id))]
    pub async fn run_turn(&self, request: TurnRequest, sink: &mut dyn AnswerSink) -> TurnOutcome {
        let mut state = self.prepare(request).await;

        // User turn goes in before generation so a generation failure
        // still leaves the question on record.
        if let Err(e) = self
            .store
            .append_turn(&state.session_id, &Message::user(&state.raw_input))
            .await
        {
            state.errors.record(e);
        }

        self.generate(&mut state).await;
        self.persist_answer(&mut state).await;
        self.maybe_summarize(&state).await;

        let delivered = stream_answer(&state.answer, sink, &self.stream_options).await;
        TurnOutcome {
            answer: state.answer,
            modality: state.prepared.modality(),
            delivered,
            error: state.errors.into_first(),
        }
    }

    /// Hydrates session context and prepares the modality-tagged input:
    /// the text path normalizes, embeds, and retrieves; the image path
    /// carries the attachment through untouched.
    async fn prepare(&self, request: TurnRequest) -> TurnState {
        let TurnRequest {
            session_id,
            text,
            attachment,
        } = request;

        let modality = Modality::classify(attachment.as_ref());
        let prepared = match (modality, attachment) {
            (Modality::Image, Some(attachment)) => PreparedContext::Image { attachment },
            _ => PreparedContext::Text {
                embedding: None,
                passages: Vec::new(),
            },
        };
        let mut state = TurnState::new(session_id, text, prepared);

        if let Err(e) = self.ensure_session(&state.session_id).await {
            state.errors.record(e);
        }
        self.hydrate(&mut state).await;

        if state.prepared.modality() == Modality::Text {
            let question = normalize(&state.raw_input);
            let embedding = match self.embedding.embed(&question).await {
                Ok(embedding) => Some(embedding),
                Err(e) => {
                    state.errors.record(e);
                    None
                }
            };
            // A missing or zero-length embedding leaves nothing to search
            // with; retrieval is skipped, not failed.
            let passages = match embedding.as_deref() {
                Some(embedding) if !embedding.is_empty() => {
                    match self.retrieval.retrieve(embedding).await {
                        Ok(passages) => passages,
                        Err(e) => {
                            state.errors.record(e);
                            Vec::new()
                        }
                    }
                }
                _ => Vec::new(),
            };
            state.prepared = PreparedContext::Text {
                embedding,
                passages,
            };
        }

        state
    }

    async fn ensure_session(&self, session_id: &str) -> Result<(), crate::store::StorageError> {
        if !self.store.session_exists(session_id).await? {
            self.store
                .create_session(session_id, chrono::Utc::now())
                .await?;
        }
        Ok(())
    }

    /// Loads the rolling summary and a recent-history snapshot. Either
    /// read failing leaves its slot empty and degrades the run.
    async fn hydrate(&self, state: &mut TurnState) {
        match self.store.summary(&state.session_id).await {
            Ok(summary) => state.summary = summary,
            Err(e) => state.errors.record(e),
        }
        match self
            .store
            .last_question_records(&state.session_id, self.summary_policy.window)
            .await
        {
            Ok(records) => state.history = summary::render_dialogue(&records),
            Err(e) => state.errors.record(e),
        }
    }

    /// Composes the prompt and calls generation; a failure swaps in the
    /// apology.
    async fn generate(&self, state: &mut TurnState) {
        let passages: Vec<String> = state
            .prepared
            .passages()
            .iter()
            .map(|p| p.text.clone())
            .collect();
        // The prompt carries the question as submitted; normalization is
        // an embedding-path concern only.
        let prompt = prompt::answer_prompt(&PromptInputs {
            passages: &passages,
            summary: &state.summary,
            history: &state.history,
            question: &state.raw_input,
        });

        let attachment = match &state.prepared {
            PreparedContext::Image { attachment } => Some(attachment.clone()),
            PreparedContext::Text { .. } => None,
        };

        // The deadline is enforced here so every client implementation is
        // bounded, not just the HTTP adapter.
        let call = self.generation.generate(&prompt, attachment.as_ref());
        match timeout(self.generation_deadline, call).await {
            Ok(Ok(answer)) => state.answer = answer,
            Ok(Err(e)) => {
                state.errors.record(e);
                state.answer = APOLOGY_ANSWER.to_string();
            }
            Err(_) => {
                state
                    .errors
                    .record(GenerationError::Timeout(self.generation_deadline));
                state.answer = APOLOGY_ANSWER.to_string();
            }
        }
    }

    /// Persists the assistant turn and, on the text path, the question
    /// record (with the embedding when the embed stage produced one).
    /// The record stores the question as submitted, so it always matches
    /// the user turn's content.
    async fn persist_answer(&self, state: &mut TurnState) {
        if let Err(e) = self
            .store
            .append_turn(&state.session_id, &Message::assistant(&state.answer))
            .await
        {
            state.errors.record(e);
        }

        if state.prepared.modality() == Modality::Text {
            if let Err(e) = self
                .store
                .save_question_record(
                    &state.session_id,
                    &state.raw_input,
                    &state.answer,
                    state.prepared.embedding(),
                )
                .await
            {
                state.errors.record(e);
            }
        }
    }

    /// Folds a previous summary and a dialogue block into a new summary
    /// via the generation collaborator, without touching the store.
    ///
    /// # Errors
    ///
    /// Propagates the generation failure; no apology substitution here.
    pub async fn summarize(
        &self,
        previous_summary: &str,
        new_dialogue: &str,
    ) -> Result<String, GenerationError> {
        self.generation.summarize(previous_summary, new_dialogue).await
    }

    /// Forces a rolling-summary refresh outside the per-turn schedule.
    pub async fn refresh_summary(&self, session_id: &str) {
        summary::refresh_summary(
            self.store.as_ref(),
            self.generation.as_ref(),
            self.summary_policy,
            session_id,
        )
        .await;
    }

    /// Checks the summarization boundary exactly once per turn, after the
    /// persist stage, and refreshes the rolling summary when due.
    async fn maybe_summarize(&self, state: &TurnState) {
        let total_turns = match self.store.total_turns(&state.session_id).await {
            Ok(n) => n,
            Err(error) => {
                tracing::warn!(session = %state.session_id, %error, "turn count read failed; skipping summary check");
                return;
            }
        };
        if self.summary_policy.due(total_turns) {
            summary::refresh_summary(
                self.store.as_ref(),
                self.generation.as_ref(),
                self.summary_policy,
                &state.session_id,
            )
            .await;
        }
    }
}
