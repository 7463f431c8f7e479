//! Data models for response scoring

use crate::planner::models::TopicCategory;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Scored dimension of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    TechnicalKnowledge,
    CommunicationSkills,
    ProblemSolving,
    DepthOfThinking,
    Relevance,
    Clarity,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::TechnicalKnowledge,
        Dimension::CommunicationSkills,
        Dimension::ProblemSolving,
        Dimension::DepthOfThinking,
        Dimension::Relevance,
        Dimension::Clarity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::TechnicalKnowledge => "technical_knowledge",
            Dimension::CommunicationSkills => "communication_skills",
            Dimension::ProblemSolving => "problem_solving",
            Dimension::DepthOfThinking => "depth_of_thinking",
            Dimension::Relevance => "relevance",
            Dimension::Clarity => "clarity",
        }
    }

    /// Human-readable name, e.g. "Technical Knowledge"
    pub fn title(self) -> &'static str {
        match self {
            Dimension::TechnicalKnowledge => "Technical Knowledge",
            Dimension::CommunicationSkills => "Communication Skills",
            Dimension::ProblemSolving => "Problem Solving",
            Dimension::DepthOfThinking => "Depth Of Thinking",
            Dimension::Relevance => "Relevance",
            Dimension::Clarity => "Clarity",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-step level used for confidence, response quality and difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Medium
    }
}

/// Direction of recent performance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl Trend {
    fn classify(later: f64, earlier: f64) -> Self {
        let diff = later - earlier;
        if diff > 0.5 {
            Trend::Improving
        } else if diff < -0.5 {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    /// Mean of the most recent window (up to 3 scores) against everything before it.
    ///
    /// The window always leaves at least one earlier score, so two scores
    /// compare last against first.
    pub fn recent_window(scores: &[f64]) -> Self {
        if scores.len() < 2 {
            return Trend::InsufficientData;
        }
        let window = 3.min(scores.len() - 1);
        let split = scores.len() - window;
        Self::classify(mean(&scores[split..]), mean(&scores[..split]))
    }

    /// Mean of the second half against the first half. Odd counts put the
    /// middle score in the second half.
    pub fn halves(scores: &[f64]) -> Self {
        if scores.len() < 2 {
            return Trend::InsufficientData;
        }
        let split = scores.len() / 2;
        Self::classify(mean(&scores[split..]), mean(&scores[..split]))
    }
}

/// Mean of a slice, 0.0 when empty
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Surface statistics of a single response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    pub word_count: usize,
    pub sentence_count: usize,
    pub has_examples: bool,
    pub has_technical_terms: bool,
    pub question_marks: usize,
}

/// Immutable evaluation of one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub topic: String,
    pub question: String,
    pub question_category: TopicCategory,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub scores: IndexMap<Dimension, f64>,
    pub dimension_feedback: IndexMap<Dimension, String>,
    pub overall_score: f64,
    pub confidence: Level,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub analysis: ResponseAnalysis,
}

impl Evaluation {
    /// Quality band fed into topic depth decisions
    pub fn quality(&self) -> Level {
        if self.overall_score >= 7.0 {
            Level::High
        } else if self.overall_score >= 5.0 {
            Level::Medium
        } else {
            Level::Low
        }
    }

    pub fn score(&self, dimension: Dimension) -> f64 {
        self.scores.get(&dimension).copied().unwrap_or(0.0)
    }
}

/// Latest scores recorded for a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSnapshot {
    pub overall_score: f64,
    pub scores: IndexMap<Dimension, f64>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregated response habits across the interview
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePatterns {
    pub average_length: f64,
    pub keyword_usage: f64,
    pub confidence_language: f64,
    pub question_frequency: f64,
    pub summary: Vec<String>,
}

/// Running picture of the candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub dimension_scores: IndexMap<Dimension, Vec<f64>>,
    pub topic_scores: IndexMap<String, TopicSnapshot>,
    pub strengths: IndexSet<String>,
    pub improvement_areas: IndexSet<String>,
    pub patterns: ResponsePatterns,
    pub history: Vec<Evaluation>,
}

impl CandidateProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimension_scores: Dimension::ALL.iter().map(|d| (*d, Vec::new())).collect(),
            topic_scores: IndexMap::new(),
            strengths: IndexSet::new(),
            improvement_areas: IndexSet::new(),
            patterns: ResponsePatterns::default(),
            history: Vec::new(),
        }
    }

    /// Mean score per dimension, skipping dimensions without data
    pub fn dimension_means(&self) -> IndexMap<Dimension, f64> {
        self.dimension_scores
            .iter()
            .filter(|(_, scores)| !scores.is_empty())
            .map(|(d, scores)| (*d, mean(scores)))
            .collect()
    }

    pub fn overall_scores(&self) -> Vec<f64> {
        self.history.iter().map(|e| e.overall_score).collect()
    }
}

/// Snapshot of the candidate's standing so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub overall_score: f64,
    pub dimension_scores: IndexMap<Dimension, f64>,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub evaluation_count: usize,
    pub performance_trend: Trend,
    pub recommendation: String,
}

/// Signals the question strategist adapts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInsights {
    pub overall_score: f64,
    pub performance_level: Level,
    pub strong_areas: Vec<String>,
    pub weak_areas: Vec<String>,
    pub suggested_difficulty: Level,
    pub trend: Trend,
    pub needs_follow_up: bool,
}

impl Default for PerformanceInsights {
    fn default() -> Self {
        Self {
            overall_score: 5.0,
            performance_level: Level::Medium,
            strong_areas: Vec::new(),
            weak_areas: Vec::new(),
            suggested_difficulty: Level::Medium,
            trend: Trend::InsufficientData,
            needs_follow_up: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_window_two_points() {
        assert_eq!(Trend::recent_window(&[3.0, 9.0]), Trend::Improving);
        assert_eq!(Trend::recent_window(&[9.0, 3.0]), Trend::Declining);
        assert_eq!(Trend::recent_window(&[5.0]), Trend::InsufficientData);
    }

    #[test]
    fn test_recent_window_uses_last_three() {
        // earlier = [2.0, 8.0] mean 5.0; recent = [5.0, 5.2, 5.3] mean 5.17
        assert_eq!(Trend::recent_window(&[2.0, 8.0, 5.0, 5.2, 5.3]), Trend::Stable);
    }

    #[test]
    fn test_halves_differs_from_recent_window() {
        let scores = [5.0, 5.0, 5.0, 5.0, 9.0, 5.0, 5.0, 5.0];
        // halves: [5,5,5,5] vs [9,5,5,5] => +1.0
        assert_eq!(Trend::halves(&scores), Trend::Improving);
        // window: [5,5,5] vs [5,5,5,5,9] => -0.8
        assert_eq!(Trend::recent_window(&scores), Trend::Declining);

        assert_eq!(Trend::halves(&[6.0, 2.0, 6.0]), Trend::Declining);
        assert_eq!(Trend::halves(&[5.0, 5.2, 5.4]), Trend::Stable);
    }

    #[test]
    fn test_profile_starts_with_every_dimension() {
        let profile = CandidateProfile::new("Ada");
        assert_eq!(profile.dimension_scores.len(), 6);
        assert!(profile.dimension_means().is_empty());
    }
}
