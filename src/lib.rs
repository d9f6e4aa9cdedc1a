//! # Tutorweave: Retrieval-Augmented Tutoring Chat Pipeline
//!
//! Tutorweave orchestrates one tutoring chat turn end to end: normalize
//! the question, classify its modality, embed and retrieve study
//! material, generate an answer against the session's rolling context,
//! persist everything, and stream the answer back chunk by chunk.
//!
//! ## Core Concepts
//!
//! - **Turn pipeline**: Fixed stage order with first-wins error capture;
//!   degraded stages never stop a turn, only a generation failure swaps
//!   in the apology answer
//! - **Collaborators**: Embedding, retrieval, and generation sit behind
//!   async traits with HTTP adapters
//! - **Context store**: Sessions, append-only turns, question records,
//!   and a rolling summary in SQLite
//! - **Streaming**: Answers are emitted character-wise to a sink; a
//!   hung-up caller aborts emission silently
//!
//! ## Quick Start
//!
//! ```no_run
//! use tutorweave::config::PipelineConfig;
//! use tutorweave::service::{ChatRequest, ChatService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! tutorweave::telemetry::init_tracing();
//!
//! let config = PipelineConfig::from_env()?;
//! let service = ChatService::from_config(&config);
//!
//! let stream = service.chat(ChatRequest::new("State the ideal gas law."));
//! println!("session: {}", stream.session_id());
//! let answer = stream.collect().await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```
//!
//! Collaborator endpoints, the database URL, and the pipeline knobs all
//! come from [`config::PipelineConfig`]; see its defaults and the
//! environment variables `from_env` reads.

pub mod clients;
pub mod config;
pub mod message;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod service;
pub mod store;
pub mod stream;
pub mod summary;
pub mod telemetry;
