//! Embedding collaborator boundary.
//!
//! The embedding backend maps normalized text to a fixed-length vector.
//! The pipeline treats its failure as recoverable: a missing embedding
//! simply means downstream retrieval has nothing to search with.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Errors raised by the embedding collaborator.
#[derive(Debug, Error, Diagnostic)]
pub enum EmbeddingError {
    /// The backend could not be reached or returned a failure status.
    #[error("embedding backend unavailable: {0}")]
    #[diagnostic(
        code(tutorweave::embedding::backend),
        help("Check the embedding service URL and that the service is running.")
    )]
    Backend(String),

    /// The input could not be embedded (for example, empty after
    /// normalization).
    #[error("malformed embedding input: {0}")]
    #[diagnostic(code(tutorweave::embedding::input))]
    MalformedInput(String),

    /// The backend answered with a payload that does not decode to a vector.
    #[error("embedding response decode: {0}")]
    #[diagnostic(code(tutorweave::embedding::decode))]
    Decode(String),
}

/// Maps normalized text to a fixed-length numeric vector.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// HTTP adapter for a remote embedding service.
///
/// Posts `{"text": ...}` and expects `{"embedding": [f32, ...]}`.
pub struct HttpEmbeddingClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpEmbeddingClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    #[instrument(skip(self, text), err)]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::MalformedInput(
                "empty text after normalization".into(),
            ));
        }
        let response = self
            .http
            .post(&self.endpoint)
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| EmbeddingError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| EmbeddingError::Backend(e.to_string()))?;

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Decode(e.to_string()))?;
        Ok(body.embedding)
    }
}
