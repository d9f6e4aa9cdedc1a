//! Generation collaborator boundary.
//!
//! Generation is the slowest and most failure-prone dependency, and the
//! only fatal one: when it fails or times out, the pipeline substitutes a
//! fixed apology for the answer. A bounded timeout is applied to every
//! call. The collaborator also backs the rolling-summary operation.

use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::instrument;

use crate::prompt;

/// A file attached to an inbound turn, with the media type the caller
/// declared for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    #[must_use]
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Whether the declared media type marks this attachment as an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Errors raised by the generation collaborator.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerationError {
    /// The backend could not be reached or returned a failure status.
    #[error("generation backend error: {0}")]
    #[diagnostic(
        code(tutorweave::generation::backend),
        help("Check the generation service URL and its upstream model availability.")
    )]
    Backend(String),

    /// The call exceeded the configured deadline. Treated exactly like a
    /// backend failure by the pipeline: fatal to answer quality.
    #[error("generation timed out after {0:?}")]
    #[diagnostic(code(tutorweave::generation::timeout))]
    Timeout(Duration),

    /// The backend answered with a payload that does not decode.
    #[error("generation response decode: {0}")]
    #[diagnostic(code(tutorweave::generation::decode))]
    Decode(String),
}

/// Maps a composed prompt (plus optional image payload) to generated text.
///
/// `summarize` folds a previous rolling summary and a block of recent
/// dialogue into a new bounded summary; it rides on the same backend and
/// shares its failure modes.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        attachment: Option<&Attachment>,
    ) -> Result<String, GenerationError>;

    async fn summarize(
        &self,
        previous_summary: &str,
        new_dialogue: &str,
    ) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<AttachmentPayload<'a>>,
}

#[derive(Serialize)]
struct AttachmentPayload<'a> {
    name: &'a str,
    media_type: &'a str,
    /// Attachment bytes hex-encoded for the JSON wire format.
    bytes: String,
}

impl<'a> AttachmentPayload<'a> {
    fn from(attachment: &'a Attachment) -> Self {
        let mut bytes = String::with_capacity(attachment.bytes.len() * 2);
        for b in &attachment.bytes {
            use std::fmt::Write;
            let _ = write!(bytes, "{b:02x}");
        }
        Self {
            name: &attachment.name,
            media_type: &attachment.media_type,
            bytes,
        }
    }
}

/// HTTP adapter for a remote generation service.
///
/// Posts `{"prompt": ..., "attachment"?: {...}}` and reads the generated
/// answer back as plain text. The summarize operation composes the
/// summary prompt locally and rides the same endpoint, so the wire
/// contract stays a single generate operation.
pub struct HttpGenerationClient {
    http: reqwest::Client,
    endpoint: String,
    deadline: Duration,
}

impl HttpGenerationClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, deadline: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            deadline,
        }
    }

    async fn call(&self, request: GenerateRequest<'_>) -> Result<String, GenerationError> {
        let fut = async {
            let response = self
                .http
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| GenerationError::Backend(e.to_string()))?
                .error_for_status()
                .map_err(|e| GenerationError::Backend(e.to_string()))?;
            response
                .text()
                .await
                .map_err(|e| GenerationError::Decode(e.to_string()))
        };
        match timeout(self.deadline, fut).await {
            Ok(result) => result.map(|text| text.trim().to_string()),
            Err(_) => Err(GenerationError::Timeout(self.deadline)),
        }
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    #[instrument(skip(self, prompt, attachment), err)]
    async fn generate(
        &self,
        prompt: &str,
        attachment: Option<&Attachment>,
    ) -> Result<String, GenerationError> {
        self.call(GenerateRequest {
            prompt,
            attachment: attachment.map(AttachmentPayload::from),
        })
        .await
    }

    #[instrument(skip(self, previous_summary, new_dialogue), err)]
    async fn summarize(
        &self,
        previous_summary: &str,
        new_dialogue: &str,
    ) -> Result<String, GenerationError> {
        let prompt = prompt::summarize_prompt(previous_summary, new_dialogue);
        self.call(GenerateRequest {
            prompt: &prompt,
            attachment: None,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_image_detection() {
        let img = Attachment::new("q.png", "image/png", vec![1, 2]);
        assert!(img.is_image());

        let pdf = Attachment::new("notes.pdf", "application/pdf", vec![3]);
        assert!(!pdf.is_image());

        let untyped = Attachment::new("blob", "", vec![]);
        assert!(!untyped.is_image());
    }

    #[test]
    fn attachment_payload_hex_encodes_bytes() {
        let attachment = Attachment::new("a", "image/png", vec![0x00, 0xff, 0x10]);
        let payload = AttachmentPayload::from(&attachment);
        assert_eq!(payload.bytes, "00ff10");
    }
}
