//! Topic planning data models

use crate::documents::models::{Importance, RequirementCategory};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interview category of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicCategory {
    Technical,
    Behavioral,
    Situational,
    SystemDesign,
}

impl TopicCategory {
    /// Topic category for a requirement, or `None` when the requirement
    /// does not become a topic of its own
    pub fn from_requirement(category: RequirementCategory) -> Option<Self> {
        match category {
            RequirementCategory::TechnicalSkill | RequirementCategory::Infrastructure => {
                Some(TopicCategory::Technical)
            }
            RequirementCategory::SystemDesign => Some(TopicCategory::SystemDesign),
            RequirementCategory::Leadership => Some(TopicCategory::Behavioral),
            RequirementCategory::Experience | RequirementCategory::General => None,
        }
    }

    /// Base time in minutes before the importance multiplier
    pub fn base_minutes(self) -> f64 {
        match self {
            TopicCategory::Technical => 6.0,
            TopicCategory::Behavioral => 5.0,
            TopicCategory::Situational => 4.0,
            TopicCategory::SystemDesign => 8.0,
        }
    }

    /// Secondary sort rank
    pub fn rank(self) -> u8 {
        match self {
            TopicCategory::Technical | TopicCategory::SystemDesign => 2,
            TopicCategory::Behavioral | TopicCategory::Situational => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TopicCategory::Technical => "technical",
            TopicCategory::Behavioral => "behavioral",
            TopicCategory::Situational => "situational",
            TopicCategory::SystemDesign => "system_design",
        }
    }
}

impl fmt::Display for TopicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How thoroughly a topic is explored. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Surface,
    Medium,
    Deep,
}

impl Depth {
    /// One step deeper; `Deep` is terminal
    pub fn next(self) -> Self {
        match self {
            Depth::Surface => Depth::Medium,
            Depth::Medium | Depth::Deep => Depth::Deep,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Surface => "surface",
            Depth::Medium => "medium",
            Depth::Deep => "deep",
        }
    }
}

impl Default for Depth {
    fn default() -> Self {
        Depth::Surface
    }
}

pub fn importance_multiplier(importance: Importance) -> f64 {
    match importance {
        Importance::High => 1.5,
        Importance::Medium => 1.0,
        Importance::Low => 0.7,
    }
}

/// Question cap per topic before a transition is recommended
pub fn max_questions(importance: Importance) -> u32 {
    match importance {
        Importance::High => 4,
        Importance::Medium => 3,
        Importance::Low => 2,
    }
}

/// A planned interview topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNode {
    pub name: String,
    pub category: TopicCategory,
    pub importance: Importance,
    /// Minutes allotted in the plan
    pub estimated_time: u32,
    pub current_depth: Depth,
    pub questions_asked: u32,
    pub covered: bool,
    /// Forced into the plan past the time budget
    pub time_critical: bool,
}

impl TopicNode {
    pub fn new(name: impl Into<String>, category: TopicCategory, importance: Importance) -> Self {
        Self {
            name: name.into(),
            category,
            importance,
            estimated_time: (category.base_minutes() * importance_multiplier(importance)) as u32,
            current_depth: Depth::Surface,
            questions_asked: 0,
            covered: false,
            time_critical: false,
        }
    }
}

/// Ordered plan for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicFlow {
    pub sequence: Vec<String>,
    pub cursor: usize,
    pub total_estimated_minutes: u32,
    /// Wall-clock minutes recorded through `EndTopic`
    pub elapsed_minutes: f64,
    pub coverage_score: f64,
}

/// Outcome of a per-response depth evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthDecision {
    pub topic: String,
    pub advance: bool,
    pub new_depth: Depth,
    pub questions_asked: u32,
    pub reasons: Vec<String>,
}

/// How completely the outgoing topic was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Complete,
    Partial,
    Incomplete,
}

/// Result of a transition request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "topic", rename_all = "lowercase")]
pub enum NextTopic {
    Topic(String),
    Exhausted,
}

/// Snapshot of topic coverage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub coverage_score: f64,
    pub covered_count: usize,
    pub total_count: usize,
    pub high_priority_covered: usize,
    pub high_priority_total: usize,
    pub uncovered_high: Vec<String>,
    /// First three uncovered medium-importance topics
    pub uncovered_medium: Vec<String>,
    pub time_utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStatus {
    pub remaining_minutes: u32,
    pub uncovered_count: usize,
    pub avg_minutes_per_remaining_topic: f64,
}

/// Whether to stay on the current topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionAdvice {
    Continue,
    Transition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePressure {
    OnTrack,
    TimeCritical,
}

/// Steering for the next question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicGuidance {
    pub current_topic: Option<String>,
    pub suggested_depth: Depth,
    pub transition: TransitionAdvice,
    pub time_status: TimePressure,
    pub category: Option<TopicCategory>,
    pub importance: Option<Importance>,
    pub current_depth: Option<Depth>,
    pub questions_asked: u32,
}

/// Time bookkeeping commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeAction {
    StartTopic(String),
    EndTopic(String),
    CheckTime,
    AdjustPlan,
}

/// Result of a [`TimeAction`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TimeReport {
    Started { topic: String },
    Ended { topic: String, minutes: f64 },
    NotStarted { topic: String },
    Status(TimeStatus),
    Plan { advice: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_time_truncates() {
        let node = TopicNode::new("Rust", TopicCategory::Technical, Importance::High);
        assert_eq!(node.estimated_time, 9);
        let node = TopicNode::new("Rust", TopicCategory::Technical, Importance::Low);
        assert_eq!(node.estimated_time, 4);
        let node = TopicNode::new("Caching", TopicCategory::SystemDesign, Importance::High);
        assert_eq!(node.estimated_time, 12);
    }

    #[test]
    fn test_depth_never_regresses() {
        assert_eq!(Depth::Surface.next(), Depth::Medium);
        assert_eq!(Depth::Medium.next(), Depth::Deep);
        assert_eq!(Depth::Deep.next(), Depth::Deep);
        assert!(Depth::Surface < Depth::Deep);
    }

    #[test]
    fn test_requirement_mapping() {
        assert_eq!(
            TopicCategory::from_requirement(RequirementCategory::Leadership),
            Some(TopicCategory::Behavioral)
        );
        assert_eq!(TopicCategory::from_requirement(RequirementCategory::General), None);
    }
}
