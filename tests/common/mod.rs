#![allow(dead_code)]

pub mod clients;

pub use clients::*;

use std::sync::Arc;

use tutorweave::pipeline::TurnPipeline;
use tutorweave::store::SqliteContextStore;

/// Fresh in-memory store with migrations applied.
pub async fn memory_store() -> Arc<SqliteContextStore> {
    Arc::new(
        SqliteContextStore::connect("sqlite::memory:")
            .await
            .unwrap(),
    )
}

/// Pipeline over an in-memory store and the given stub collaborators.
pub async fn pipeline_with(
    embedding: Arc<StubEmbeddingClient>,
    retrieval: Arc<StubRetrievalClient>,
    generation: Arc<StubGenerationClient>,
) -> TurnPipeline {
    TurnPipeline::new(memory_store().await, embedding, retrieval, generation)
}
