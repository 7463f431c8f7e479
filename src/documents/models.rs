//! Structured output of document analysis

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of job requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    TechnicalSkill,
    SystemDesign,
    Leadership,
    Infrastructure,
    Experience,
    General,
}

/// Relative importance, shared by requirements and topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    /// Sort rank, higher is more important
    pub fn rank(self) -> u8 {
        match self {
            Importance::High => 3,
            Importance::Medium => 2,
            Importance::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requirement from a job posting. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub category: RequirementCategory,
    pub text: String,
    pub importance: Importance,
}

impl Requirement {
    pub fn new(category: RequirementCategory, text: impl Into<String>, importance: Importance) -> Self {
        Self {
            category,
            text: text.into(),
            importance,
        }
    }
}

/// Parsed job posting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub requirements: Vec<Requirement>,
    pub responsibilities: Vec<String>,
}

/// Parsed candidate resume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub name: String,
    pub title: String,
    pub experience_summary: String,
    pub skills: Vec<String>,
    pub history: Vec<String>,
    pub education: String,
}

/// Overlap between posting and resume skills
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub additional_skills: Vec<String>,
    pub match_percentage: f64,
}
