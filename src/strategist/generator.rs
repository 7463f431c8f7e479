//! Text-generation capability
//!
//! The strategist talks to any backend through [`TextGenerator`]. The
//! [`TemplateGenerator`] fallback needs no network and echoes the question
//! shape carried in the prompt.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Prompt line carrying the pre-rendered question
pub const QUESTION_SHAPE_PREFIX: &str = "Question shape: ";

/// Text generation errors
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Circuit breaker open for {0}")]
    CircuitOpen(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The stream stopped before its terminal marker
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Streaming is not supported by this generator")]
    StreamingUnsupported,
}

/// A text-generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the full text for a prompt
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError>;

    /// Generate text incrementally, sending fragments in order over `tx`.
    /// Returns `Ok` only once the stream terminated normally.
    async fn stream_complete(
        &self,
        _prompt: &str,
        _temperature: f32,
        _tx: mpsc::Sender<String>,
    ) -> Result<(), GenerationError> {
        Err(GenerationError::StreamingUnsupported)
    }

    fn name(&self) -> &str;
}

/// Offline generator used when no API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    fn render(prompt: &str) -> Result<String, GenerationError> {
        prompt
            .lines()
            .find_map(|line| line.trim().strip_prefix(QUESTION_SHAPE_PREFIX))
            .map(str::trim)
            .filter(|shape| !shape.is_empty())
            .map(str::to_string)
            .ok_or_else(|| GenerationError::InvalidResponse("prompt carries no question shape".into()))
    }
}

#[async_trait]
impl TextGenerator for TemplateGenerator {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, GenerationError> {
        Self::render(prompt)
    }

    async fn stream_complete(
        &self,
        prompt: &str,
        _temperature: f32,
        tx: mpsc::Sender<String>,
    ) -> Result<(), GenerationError> {
        let text = Self::render(prompt)?;
        for word in text.split_inclusive(' ') {
            tx.send(word.to_string())
                .await
                .map_err(|_| GenerationError::StreamInterrupted("receiver dropped".into()))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "template"
    }
}
