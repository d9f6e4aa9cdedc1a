//! Incremental answer emission.
//!
//! The pipeline computes the full answer before streaming begins; the
//! stream stage then feeds it to an [`AnswerSink`] chunk by chunk (one
//! character at a time, with an optional inter-character delay for
//! perceived-latency shaping). A sink refusing a chunk means the caller
//! hung up: emission stops silently, with no error raised into the
//! pipeline.

use std::io;
use std::time::Duration;

use async_trait::async_trait;

/// Abstraction over an output target that consumes answer chunks.
#[async_trait]
pub trait AnswerSink: Send {
    /// Deliver one chunk. An `Err` means the receiving side is gone and
    /// the caller should stop emitting.
    async fn emit(&mut self, chunk: &str) -> io::Result<()>;
}

/// Channel-backed sink for streaming to an async consumer.
pub struct ChannelSink {
    tx: flume::Sender<String>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: flume::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl AnswerSink for ChannelSink {
    async fn emit(&mut self, chunk: &str) -> io::Result<()> {
        self.tx
            .send_async(chunk.to_string())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "answer receiver dropped"))
    }
}

/// In-memory sink for tests and snapshots.
#[derive(Debug, Default)]
pub struct BufferSink {
    chunks: Vec<String>,
}

impl BufferSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All chunks received so far, in emission order.
    #[must_use]
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// The chunks joined back into one string.
    #[must_use]
    pub fn joined(&self) -> String {
        self.chunks.concat()
    }
}

#[async_trait]
impl AnswerSink for BufferSink {
    async fn emit(&mut self, chunk: &str) -> io::Result<()> {
        self.chunks.push(chunk.to_string());
        Ok(())
    }
}

/// Streaming knobs. The delay is presentation only — correctness never
/// depends on it, and tests leave it off.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamOptions {
    /// Pause inserted between characters, if any.
    pub char_delay: Option<Duration>,
}

impl StreamOptions {
    #[must_use]
    pub fn with_char_delay(mut self, delay: Duration) -> Self {
        self.char_delay = Some(delay);
        self
    }
}

/// Emits `answer` to `sink` one character at a time.
///
/// Returns `true` when the full answer was delivered, `false` when the
/// sink was closed mid-stream (a transport-level abort, not an error).
pub async fn stream_answer(
    answer: &str,
    sink: &mut dyn AnswerSink,
    options: &StreamOptions,
) -> bool {
    let mut buf = [0u8; 4];
    for c in answer.chars() {
        if sink.emit(c.encode_utf8(&mut buf)).await.is_err() {
            tracing::debug!("answer sink closed; stopping emission");
            return false;
        }
        if let Some(delay) = options.char_delay {
            tokio::time::sleep(delay).await;
        }
    }
    true
}
