//! Question strategy and text generation
//!
//! Selects the question shape from topic guidance and performance insights,
//! then delegates wording to a [`TextGenerator`] backend.

pub mod circuit_breaker;
pub mod client;
pub mod generator;
#[allow(clippy::module_inception)]
pub mod strategist;
pub mod templates;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use client::OpenAiClient;
pub use generator::{GenerationError, TemplateGenerator, TextGenerator};
pub use strategist::{
    GeneratedQuestion, PromptContext, QuestionRequest, QuestionSource, QuestionStrategist,
    StrategyAdjustment,
};
pub use templates::{Bucket, FollowUpBand};
