//! Per-turn pipeline state.
//!
//! One [`TurnState`] value is constructed at request entry, handed from
//! stage to stage by move (each stage returns the updated value, so data
//! flow stays auditable), and discarded once the answer has been streamed.
//! It is never shared across requests.

use crate::clients::{Attachment, Passage};

use super::errors::ErrorSlot;

/// Whether a turn's primary content is text or an image attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    /// Classifies a turn from its attachment: present and declared as an
    /// image ⇒ [`Modality::Image`]; absent, untyped, or any other type ⇒
    /// [`Modality::Text`].
    #[must_use]
    pub fn classify(attachment: Option<&Attachment>) -> Self {
        match attachment {
            Some(a) if a.is_image() => Modality::Image,
            _ => Modality::Text,
        }
    }
}

/// The context the generate stage consumes, tagged by modality.
///
/// The text branch carries whatever the embed and retrieve stages managed
/// to produce (either may have degraded); the image branch carries the
/// attachment bytes and skips both.
#[derive(Clone, Debug)]
pub enum PreparedContext {
    Text {
        /// Embedding of the normalized input; `None` when the embed stage
        /// failed or was skipped.
        embedding: Option<Vec<f32>>,
        /// Relevance-filtered passages; empty when retrieval degraded or
        /// had nothing to search with.
        passages: Vec<Passage>,
    },
    Image {
        attachment: Attachment,
    },
}

impl PreparedContext {
    #[must_use]
    pub fn modality(&self) -> Modality {
        match self {
            PreparedContext::Text { .. } => Modality::Text,
            PreparedContext::Image { .. } => Modality::Image,
        }
    }

    /// The embedding to index the turn's question record by, if any.
    #[must_use]
    pub fn embedding(&self) -> Option<&[f32]> {
        match self {
            PreparedContext::Text { embedding, .. } => embedding.as_deref(),
            PreparedContext::Image { .. } => None,
        }
    }

    #[must_use]
    pub fn passages(&self) -> &[Passage] {
        match self {
            PreparedContext::Text { passages, .. } => passages,
            PreparedContext::Image { .. } => &[],
        }
    }
}

/// Everything one in-flight turn accumulates on its way through the
/// pipeline. Exclusively owned by that turn's task.
#[derive(Debug)]
pub struct TurnState {
    /// Caller-supplied opaque session identifier.
    pub session_id: String,
    /// The user's input exactly as submitted (persisted verbatim).
    pub raw_input: String,
    /// Modality-tagged context for the generate stage.
    pub prepared: PreparedContext,
    /// Rolling-summary snapshot loaded at entry; empty when none exists.
    pub summary: String,
    /// Recent-history snapshot rendered as `User:`/`Bot:` lines.
    pub history: String,
    /// The final answer (generated text, or the apology on fatal failure).
    pub answer: String,
    /// First error encountered; never halts the pipeline.
    pub errors: ErrorSlot,
}

impl TurnState {
    #[must_use]
    pub fn new(session_id: String, raw_input: String, prepared: PreparedContext) -> Self {
        Self {
            session_id,
            raw_input,
            prepared,
            summary: String::new(),
            history: String::new(),
            answer: String::new(),
            errors: ErrorSlot::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_without_attachment_is_text() {
        assert_eq!(Modality::classify(None), Modality::Text);
    }

    #[test]
    fn classify_image_attachment() {
        let png = Attachment::new("q.png", "image/png", vec![1]);
        assert_eq!(Modality::classify(Some(&png)), Modality::Image);
    }

    #[test]
    fn classify_non_image_attachment_is_text() {
        let pdf = Attachment::new("notes.pdf", "application/pdf", vec![1]);
        assert_eq!(Modality::classify(Some(&pdf)), Modality::Text);

        let untyped = Attachment::new("blob", "", vec![1]);
        assert_eq!(Modality::classify(Some(&untyped)), Modality::Text);
    }

    #[test]
    fn image_context_has_no_embedding_or_passages() {
        let ctx = PreparedContext::Image {
            attachment: Attachment::new("q.png", "image/png", vec![1]),
        };
        assert_eq!(ctx.modality(), Modality::Image);
        assert!(ctx.embedding().is_none());
        assert!(ctx.passages().is_empty());
    }
}
