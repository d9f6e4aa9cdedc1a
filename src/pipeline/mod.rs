//! The turn pipeline: orchestration of one chat turn end to end.
//!
//! A turn moves through fixed stages — hydrate, classify, embed,
//! retrieve, persist, generate, persist, summarize-when-due, stream —
//! with a first-wins error slot carrying the earliest collaborator
//! failure. Degradation is the norm: a missing embedding or empty
//! passage list never stops the turn, and only a generation failure
//! costs the caller a real answer.

pub mod errors;
pub mod runner;
pub mod state;

pub use errors::{ErrorSlot, PipelineError};
pub use runner::{TurnOutcome, TurnPipeline, TurnRequest, APOLOGY_ANSWER};
pub use state::{Modality, PreparedContext, TurnState};
