//! External collaborator boundaries: embedding, retrieval, and generation.
//!
//! Each collaborator is a narrow request/response trait with its own error
//! type, plus an HTTP adapter for the corresponding remote service. The
//! pipeline depends only on the traits; the adapters are wiring.

pub mod embedding;
pub mod generation;
pub mod retrieval;

pub use embedding::{EmbeddingClient, EmbeddingError, HttpEmbeddingClient};
pub use generation::{Attachment, GenerationClient, GenerationError, HttpGenerationClient};
pub use retrieval::{HttpRetrievalClient, Passage, RelevancePolicy, RetrievalClient, RetrievalError};
