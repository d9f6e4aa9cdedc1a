//! Pipeline error taxonomy and the first-wins error slot.
//!
//! Every stage catches its own collaborator's failure and records it here.
//! Only generation failures (including timeouts) are fatal to answer
//! quality; everything else degrades the pipeline and continues.

use miette::Diagnostic;
use thiserror::Error;

use crate::clients::{EmbeddingError, GenerationError, RetrievalError};
use crate::store::StorageError;

/// Sum of the collaborator failures a turn can encounter.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Whether this failure cost the caller a real answer. Generation
    /// failures (timeouts included) trigger the apology substitution;
    /// every other failure leaves the answer intact.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Generation(_))
    }
}

/// First-wins error record for one in-flight turn.
///
/// The first error a stage records is kept; later errors in the same run
/// are logged and dropped, never overwriting the original.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    first: Option<PipelineError>,
}

impl ErrorSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error, keeping only the first.
    pub fn record(&mut self, error: impl Into<PipelineError>) {
        let error = error.into();
        if self.first.is_some() {
            tracing::warn!(%error, "additional pipeline error after the first; not recorded");
            return;
        }
        tracing::warn!(%error, "pipeline stage degraded");
        self.first = Some(error);
    }

    /// The first error recorded during this run, if any.
    #[must_use]
    pub fn first(&self) -> Option<&PipelineError> {
        self.first.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    #[must_use]
    pub fn into_first(self) -> Option<PipelineError> {
        self.first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins() {
        let mut slot = ErrorSlot::new();
        assert!(slot.is_empty());

        slot.record(EmbeddingError::Backend("down".into()));
        slot.record(RetrievalError::Backend("also down".into()));

        match slot.first() {
            Some(PipelineError::Embedding(_)) => {}
            other => panic!("expected embedding error, got {other:?}"),
        }
    }

    #[test]
    fn fatality_split() {
        let generation: PipelineError = GenerationError::Backend("boom".into()).into();
        assert!(generation.is_fatal());

        let timeout: PipelineError =
            GenerationError::Timeout(std::time::Duration::from_secs(30)).into();
        assert!(timeout.is_fatal());

        let storage: PipelineError = StorageError::Backend("disk".into()).into();
        assert!(!storage.is_fatal());

        let embedding: PipelineError = EmbeddingError::Backend("down".into()).into();
        assert!(!embedding.is_fatal());
    }
}
