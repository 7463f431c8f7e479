//! Multi-dimensional heuristic response scoring
//!
//! Every response is scored on six weighted dimensions using keyword and
//! length heuristics, then folded into a running candidate profile that
//! reports trends and steering recommendations.

pub mod criteria;
pub mod models;
pub mod scorer;

pub use models::{
    Assessment, CandidateProfile, Dimension, Evaluation, Level, PerformanceInsights,
    ResponseAnalysis, Trend,
};
pub use scorer::{FeedbackFocus, ResponseScorer};
