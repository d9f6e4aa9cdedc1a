//! Stub collaborators with call counting and switchable failure modes.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tutorweave::clients::{
    Attachment, EmbeddingClient, EmbeddingError, GenerationClient, GenerationError, Passage,
    RetrievalClient, RetrievalError,
};

enum EmbeddingMode {
    Vector,
    Empty,
    Fail,
}

pub struct StubEmbeddingClient {
    mode: EmbeddingMode,
    calls: AtomicUsize,
}

impl StubEmbeddingClient {
    fn with_mode(mode: EmbeddingMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ok() -> Self {
        Self::with_mode(EmbeddingMode::Vector)
    }

    /// Succeeds with a zero-length vector.
    pub fn empty() -> Self {
        Self::with_mode(EmbeddingMode::Empty)
    }

    pub fn failing() -> Self {
        Self::with_mode(EmbeddingMode::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingClient for StubEmbeddingClient {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            EmbeddingMode::Vector => Ok(vec![0.1, 0.2, 0.3]),
            EmbeddingMode::Empty => Ok(Vec::new()),
            EmbeddingMode::Fail => Err(EmbeddingError::Backend("stub embedding down".into())),
        }
    }
}

pub struct StubRetrievalClient {
    passages: Vec<Passage>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubRetrievalClient {
    pub fn with_passages(texts: &[&str]) -> Self {
        Self {
            passages: texts
                .iter()
                .map(|t| Passage {
                    text: (*t).to_string(),
                    distance: 0.1,
                })
                .collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::with_passages(&[])
    }

    pub fn failing() -> Self {
        Self {
            passages: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetrievalClient for StubRetrievalClient {
    async fn retrieve(&self, _embedding: &[f32]) -> Result<Vec<Passage>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(RetrievalError::Backend("stub retrieval down".into()))
        } else {
            Ok(self.passages.clone())
        }
    }
}

pub struct StubGenerationClient {
    answer: String,
    fail: bool,
    generate_calls: AtomicUsize,
    summarize_calls: AtomicUsize,
}

impl StubGenerationClient {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            fail: false,
            generate_calls: AtomicUsize::new(0),
            summarize_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: String::new(),
            fail: true,
            generate_calls: AtomicUsize::new(0),
            summarize_calls: AtomicUsize::new(0),
        }
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn summarize_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for StubGenerationClient {
    async fn generate(
        &self,
        _prompt: &str,
        _attachment: Option<&Attachment>,
    ) -> Result<String, GenerationError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(GenerationError::Backend("stub generation down".into()))
        } else {
            Ok(self.answer.clone())
        }
    }

    async fn summarize(
        &self,
        _previous_summary: &str,
        _new_dialogue: &str,
    ) -> Result<String, GenerationError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(GenerationError::Backend("stub generation down".into()))
        } else {
            Ok("condensed summary".to_string())
        }
    }
}

/// Never completes a call, for orchestrator timeout tests.
pub struct HangingGenerationClient;

#[async_trait]
impl GenerationClient for HangingGenerationClient {
    async fn generate(
        &self,
        _prompt: &str,
        _attachment: Option<&Attachment>,
    ) -> Result<String, GenerationError> {
        std::future::pending().await
    }

    async fn summarize(
        &self,
        _previous_summary: &str,
        _new_dialogue: &str,
    ) -> Result<String, GenerationError> {
        std::future::pending().await
    }
}

/// Panics inside `generate`, for supervisor containment tests.
pub struct PanickingGenerationClient;

#[async_trait]
impl GenerationClient for PanickingGenerationClient {
    async fn generate(
        &self,
        _prompt: &str,
        _attachment: Option<&Attachment>,
    ) -> Result<String, GenerationError> {
        panic!("intentional test panic");
    }

    async fn summarize(
        &self,
        _previous_summary: &str,
        _new_dialogue: &str,
    ) -> Result<String, GenerationError> {
        panic!("intentional test panic");
    }
}
