//! Retrieval collaborator boundary and the relevance-filter policy.
//!
//! Retrieval maps an embedding to a ranked list of study-material passages
//! with distance scores. The relevance filter lives on this side of the
//! trait boundary: [`RetrievalClient::retrieve`] returns an
//! already-filtered list and the orchestrator imposes no further filtering.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// One retrieved study-material passage with its distance score
/// (smaller is closer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub distance: f32,
}

/// Errors raised by the retrieval collaborator.
#[derive(Debug, Error, Diagnostic)]
pub enum RetrievalError {
    /// The backend could not be reached or returned a failure status.
    #[error("retrieval backend unavailable: {0}")]
    #[diagnostic(
        code(tutorweave::retrieval::backend),
        help("Check the vector service URL and that the index is loaded.")
    )]
    Backend(String),

    /// The backend answered with a payload that does not decode.
    #[error("retrieval response decode: {0}")]
    #[diagnostic(code(tutorweave::retrieval::decode))]
    Decode(String),
}

/// Maps an embedding to a ranked, relevance-filtered list of passages.
#[async_trait]
pub trait RetrievalClient: Send + Sync {
    async fn retrieve(&self, embedding: &[f32]) -> Result<Vec<Passage>, RetrievalError>;
}

/// Distance-threshold-plus-fallback policy applied to raw retrieval hits.
///
/// Passages with distance strictly below `distance_threshold` are kept.
/// When no passage clears the threshold but at least one candidate exists,
/// the two closest are kept anyway, so that retrieval never returns zero
/// context while *some* candidate exists.
#[derive(Clone, Debug)]
pub struct RelevancePolicy {
    /// Maximum number of raw candidates considered.
    pub top_k: u32,
    /// Distance below which a passage counts as relevant.
    pub distance_threshold: f32,
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            top_k: 5,
            distance_threshold: 0.75,
        }
    }
}

impl RelevancePolicy {
    /// Number of closest passages kept when nothing clears the threshold.
    pub const FALLBACK_KEEP: usize = 2;

    /// Applies the filter to raw hits, returning the kept passages in
    /// ascending distance order.
    #[must_use]
    pub fn apply(&self, mut hits: Vec<Passage>) -> Vec<Passage> {
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(self.top_k as usize);

        let relevant = hits
            .iter()
            .filter(|p| p.distance < self.distance_threshold)
            .count();
        if relevant > 0 {
            hits.truncate(relevant);
            hits
        } else {
            hits.truncate(Self::FALLBACK_KEEP);
            hits
        }
    }
}

#[derive(Serialize)]
struct RetrieveRequest<'a> {
    embedding: &'a [f32],
    top_k: u32,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    chunks: Vec<Passage>,
}

/// HTTP adapter for a remote vector-search service.
///
/// Posts `{"embedding": [...], "top_k": K}` and expects
/// `{"chunks": [{"text": ..., "distance": ...}, ...]}`. The relevance
/// policy is applied to the returned candidates before they cross the
/// trait boundary.
pub struct HttpRetrievalClient {
    http: reqwest::Client,
    endpoint: String,
    policy: RelevancePolicy,
}

impl HttpRetrievalClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, policy: RelevancePolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            policy,
        }
    }
}

#[async_trait]
impl RetrievalClient for HttpRetrievalClient {
    #[instrument(skip(self, embedding), err)]
    async fn retrieve(&self, embedding: &[f32]) -> Result<Vec<Passage>, RetrievalError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&RetrieveRequest {
                embedding,
                top_k: self.policy.top_k,
            })
            .send()
            .await
            .map_err(|e| RetrievalError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| RetrievalError::Backend(e.to_string()))?;

        let body: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))?;
        Ok(self.policy.apply(body.chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str, distance: f32) -> Passage {
        Passage {
            text: text.to_string(),
            distance,
        }
    }

    #[test]
    fn keeps_passages_below_threshold() {
        let policy = RelevancePolicy::default();
        let kept = policy.apply(vec![
            passage("a", 0.2),
            passage("b", 0.9),
            passage("c", 0.5),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].text, "a");
        assert_eq!(kept[1].text, "c");
    }

    #[test]
    fn fallback_keeps_two_closest_when_none_relevant() {
        let policy = RelevancePolicy::default();
        let kept = policy.apply(vec![
            passage("far", 0.95),
            passage("near", 0.9),
            passage("farther", 0.99),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].text, "near");
        assert_eq!(kept[1].text, "far");
    }

    #[test]
    fn single_candidate_fallback() {
        let policy = RelevancePolicy::default();
        let kept = policy.apply(vec![passage("only", 0.99)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn empty_hits_stay_empty() {
        let policy = RelevancePolicy::default();
        assert!(policy.apply(vec![]).is_empty());
    }

    #[test]
    fn top_k_caps_candidates_before_filtering() {
        let policy = RelevancePolicy {
            top_k: 2,
            distance_threshold: 0.75,
        };
        let kept = policy.apply(vec![
            passage("a", 0.1),
            passage("b", 0.2),
            passage("c", 0.3),
        ]);
        assert_eq!(kept.len(), 2);
    }
}
