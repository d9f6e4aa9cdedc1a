//! Pipeline configuration.
//!
//! All knobs carry working defaults so `PipelineConfig::default()` runs
//! against local services out of the box; `from_env` layers environment
//! overrides (loading a `.env` file first when present) on top of them.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An environment variable was set to a value that does not parse.
    #[error("invalid value for {key}: {message}")]
    #[diagnostic(
        code(tutorweave::config::env_parse),
        help("Unset the variable to fall back to the default.")
    )]
    EnvParse { key: String, message: String },
}

/// Everything the pipeline needs to reach its collaborators and shape a
/// turn.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Endpoint of the embedding service.
    pub embedding_url: String,
    /// Endpoint of the vector-search service.
    pub retrieval_url: String,
    /// Endpoint of the generation service.
    pub generation_url: String,
    /// SQLite database URL (or `sqlite::memory:` for ephemeral use).
    pub database_url: String,
    /// Candidate passages requested per retrieval.
    pub top_k: u32,
    /// Distance cutoff for the relevance filter.
    pub distance_threshold: f32,
    /// Persisted turns between rolling-summary refreshes.
    pub summary_window: u32,
    /// Deadline applied to every generation call.
    pub generation_timeout: Duration,
    /// Inter-character streaming delay; `None` disables it.
    pub char_delay: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embedding_url: "http://localhost:8001/embed".to_string(),
            retrieval_url: "http://localhost:8002/query".to_string(),
            generation_url: "http://localhost:8003/generate".to_string(),
            database_url: "sqlite:tutorweave.db".to_string(),
            top_k: 5,
            distance_threshold: 0.75,
            summary_window: 6,
            generation_timeout: Duration::from_secs(30),
            char_delay: Some(Duration::from_millis(2)),
        }
    }
}

impl PipelineConfig {
    /// Builds a configuration from the environment, falling back to the
    /// defaults for anything unset. Reads a `.env` file when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvParse`] when a set variable holds a
    /// value that does not parse as its expected type.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(url) = std::env::var("EMBEDDING_SERVICE_URL") {
            config.embedding_url = url;
        }
        if let Ok(url) = std::env::var("VECTOR_SERVICE_URL") {
            config.retrieval_url = url;
        }
        if let Ok(url) = std::env::var("AI_SERVICE_URL") {
            config.generation_url = url;
        }
        if let Ok(name) = std::env::var("SQLITE_DB_NAME") {
            config.database_url = format!("sqlite:{name}");
        }
        if let Ok(raw) = std::env::var("TOP_K") {
            config.top_k = parse_env("TOP_K", &raw, "a positive integer")?;
        }
        if let Ok(raw) = std::env::var("DISTANCE_THRESHOLD") {
            config.distance_threshold = parse_env("DISTANCE_THRESHOLD", &raw, "a number")?;
        }
        if let Ok(raw) = std::env::var("SUMMARY_WINDOW") {
            config.summary_window = parse_env("SUMMARY_WINDOW", &raw, "a non-negative integer")?;
        }
        if let Ok(raw) = std::env::var("GENERATION_TIMEOUT_SECS") {
            let secs: u64 = parse_env("GENERATION_TIMEOUT_SECS", &raw, "seconds as an integer")?;
            config.generation_timeout = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("STREAM_CHAR_DELAY_MS") {
            let millis: u64 = parse_env("STREAM_CHAR_DELAY_MS", &raw, "milliseconds as an integer")?;
            config.char_delay = (millis > 0).then(|| Duration::from_millis(millis));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    #[must_use]
    pub fn with_summary_window(mut self, window: u32) -> Self {
        self.summary_window = window;
        self
    }

    #[must_use]
    pub fn with_char_delay(mut self, delay: Option<Duration>) -> Self {
        self.char_delay = delay;
        self
    }
}

fn parse_env<T: std::str::FromStr>(
    key: &str,
    raw: &str,
    expected: &str,
) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::EnvParse {
        key: key.to_string(),
        message: format!("expected {expected}, got {raw:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = PipelineConfig::default();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.distance_threshold, 0.75);
        assert_eq!(config.summary_window, 6);
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert!(config.char_delay.is_some());
    }

    #[test]
    fn parse_env_rejects_garbage() {
        let err = parse_env::<u32>("TOP_K", "five", "a positive integer").unwrap_err();
        let ConfigError::EnvParse { key, message } = err;
        assert_eq!(key, "TOP_K");
        assert!(message.contains("five"));
    }
}
