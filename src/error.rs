//! Error types for the interview coordinator

use crate::coordinator::shared_context::{KeyGroup, Owner};
use crate::strategist::generator::GenerationError;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, InterviewError>;

/// Interview coordinator errors
#[derive(Debug, thiserror::Error)]
pub enum InterviewError {
    /// Topic operation attempted before a sequence was planned
    #[error("Topic flow has not been planned")]
    NotPlanned,

    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("No active interview session")]
    NoActiveSession,

    #[error("Storage error: {0}")]
    Storage(String),

    /// Source document missing or unreadable
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    /// A component wrote a shared-context key group it does not own
    #[error("{owner:?} is not allowed to write {group:?}")]
    UnauthorizedWrite { owner: Owner, group: KeyGroup },

    #[error("Shared context bus is closed")]
    ContextClosed,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<std::io::Error> for InterviewError {
    fn from(e: std::io::Error) -> Self {
        InterviewError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for InterviewError {
    fn from(e: serde_json::Error) -> Self {
        InterviewError::Storage(e.to_string())
    }
}

impl From<config::ConfigError> for InterviewError {
    fn from(e: config::ConfigError) -> Self {
        InterviewError::Configuration(e.to_string())
    }
}

impl From<GenerationError> for InterviewError {
    fn from(e: GenerationError) -> Self {
        InterviewError::Generation(e.to_string())
    }
}
