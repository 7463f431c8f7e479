//! Session state, transcript and evaluation report models

use crate::planner::models::{CoverageReport, TopicCategory};
use crate::scoring::models::{Evaluation, Trend};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Interview phase. Moves strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Introduction,
    Technical,
    Behavioral,
    Conclusion,
    Complete,
}

impl Phase {
    /// Fixed successor; `Complete` maps to itself
    pub fn successor(self) -> Self {
        match self {
            Phase::Introduction => Phase::Technical,
            Phase::Technical => Phase::Behavioral,
            Phase::Behavioral => Phase::Conclusion,
            Phase::Conclusion | Phase::Complete => Phase::Complete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Introduction => "introduction",
            Phase::Technical => "technical",
            Phase::Behavioral => "behavioral",
            Phase::Conclusion => "conclusion",
            Phase::Complete => "complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a recorded question was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Introduction,
    Technical,
    Behavioral,
    Situational,
    SystemDesign,
    #[serde(rename = "follow-up")]
    FollowUp,
    Closing,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Introduction => "introduction",
            QuestionKind::Technical => "technical",
            QuestionKind::Behavioral => "behavioral",
            QuestionKind::Situational => "situational",
            QuestionKind::SystemDesign => "system_design",
            QuestionKind::FollowUp => "follow-up",
            QuestionKind::Closing => "closing",
        }
    }
}

impl From<TopicCategory> for QuestionKind {
    fn from(category: TopicCategory) -> Self {
        match category {
            TopicCategory::Technical => QuestionKind::Technical,
            TopicCategory::Behavioral => QuestionKind::Behavioral,
            TopicCategory::Situational => QuestionKind::Situational,
            TopicCategory::SystemDesign => QuestionKind::SystemDesign,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub topic: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub evaluation: Option<Evaluation>,
}

/// Score keys kept in the session score map
pub const SCORE_KEYS: [&str; 4] = [
    "technical_knowledge",
    "communication_skills",
    "problem_solving",
    "overall",
];

/// One interview session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub candidate_name: String,
    pub job_title: String,
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
    pub current_phase: Phase,
    pub current_topic: Option<String>,
    pub questions: Vec<QuestionRecord>,
    pub responses: Vec<ResponseRecord>,
    pub scores: IndexMap<String, f64>,
    pub topic_progression: Option<CoverageReport>,
    pub evaluation_history: Vec<Evaluation>,
}

impl Session {
    pub fn new(
        session_id: impl Into<String>,
        candidate_name: impl Into<String>,
        job_title: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            candidate_name: candidate_name.into(),
            job_title: job_title.into(),
            start_time: now,
            last_activity: now,
            is_active: true,
            current_phase: Phase::Introduction,
            current_topic: None,
            questions: Vec::new(),
            responses: Vec::new(),
            scores: SCORE_KEYS.iter().map(|k| (k.to_string(), 0.0)).collect(),
            topic_progression: None,
            evaluation_history: Vec::new(),
        }
    }

    /// Session id derived from the creation time
    pub fn id_for(now: DateTime<Utc>) -> String {
        format!("interview_{}", now.format("%Y%m%d_%H%M%S"))
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    fn idle_secs(&self, now: DateTime<Utc>) -> f64 {
        (now - self.last_activity).num_milliseconds() as f64 / 1000.0
    }

    /// True once the session has been idle longer than `timeout` while active
    pub fn is_timed_out_at(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.is_active && self.idle_secs(now) > timeout.as_secs_f64()
    }

    /// Whole seconds left in the inactivity window, never negative
    pub fn time_remaining_at(&self, now: DateTime<Utc>, timeout: Duration) -> u64 {
        let idle = self.idle_secs(now).max(0.0) as u64;
        timeout.as_secs().saturating_sub(idle)
    }

    /// Questions and responses merged by timestamp. Entries sharing a
    /// timestamp keep questions-then-responses insertion order.
    pub fn transcript(&self, end_time: DateTime<Utc>) -> Transcript {
        let mut conversation: Vec<TranscriptEntry> = self
            .questions
            .iter()
            .map(|q| TranscriptEntry::Question {
                timestamp: q.timestamp,
                content: q.question.clone(),
                topic: q.topic.clone(),
                question_type: q.kind,
            })
            .chain(self.responses.iter().map(|r| TranscriptEntry::Response {
                timestamp: r.timestamp,
                content: r.response.clone(),
            }))
            .collect();
        conversation.sort_by_key(|entry| entry.timestamp());

        Transcript {
            session_id: self.session_id.clone(),
            candidate_name: self.candidate_name.clone(),
            job_title: self.job_title.clone(),
            start_time: self.start_time,
            end_time,
            conversation,
        }
    }

    fn score(&self, key: &str) -> f64 {
        self.scores.get(key).copied().unwrap_or(0.0)
    }

    /// Threshold-based textual feedback from the score map
    pub fn detailed_feedback(&self) -> DetailedFeedback {
        let mut feedback = DetailedFeedback::default();

        let rules = [
            (
                "technical_knowledge",
                "Strong technical knowledge and expertise",
                "Technical knowledge needs improvement",
            ),
            (
                "communication_skills",
                "Excellent communication and articulation",
                "Communication skills could be enhanced",
            ),
            (
                "problem_solving",
                "Strong problem-solving approach",
                "Problem-solving methodology needs work",
            ),
        ];
        for (key, strength, improvement) in rules {
            let score = self.score(key);
            if score >= 7.0 {
                feedback.strengths.push(strength.to_string());
            } else if score < 5.0 {
                feedback.areas_for_improvement.push(improvement.to_string());
            }
        }

        let overall = self.score("overall");
        let (assessment, recommendation) = if overall >= 8.0 {
            ("Excellent candidate with strong performance", "Highly recommend for the position")
        } else if overall >= 6.0 {
            ("Good candidate with solid performance", "Recommend for the position")
        } else if overall >= 4.0 {
            ("Average candidate with mixed performance", "Consider with reservations")
        } else {
            ("Below average performance", "Do not recommend for the position")
        };
        feedback.overall_assessment = assessment.to_string();
        feedback.recommendation = recommendation.to_string();

        feedback
    }

    /// Final report; the trend compares first and second halves of the
    /// evaluation scores
    pub fn evaluation_report(&self, now: DateTime<Utc>) -> EvaluationReport {
        let overall_scores: Vec<f64> = self
            .evaluation_history
            .iter()
            .map(|e| e.overall_score)
            .collect();

        EvaluationReport {
            session_id: self.session_id.clone(),
            candidate_name: self.candidate_name.clone(),
            job_title: self.job_title.clone(),
            evaluation_date: now,
            scores: self.scores.clone(),
            total_questions: self.questions.len(),
            total_responses: self.responses.len(),
            interview_duration_secs: (now - self.start_time).num_seconds().max(0) as u64,
            phases_completed: self.current_phase,
            detailed_feedback: self.detailed_feedback(),
            topic_coverage: self.topic_progression.clone(),
            evaluation_history: self.evaluation_history.clone(),
            performance_trend: Trend::halves(&overall_scores),
        }
    }
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TranscriptEntry {
    Question {
        timestamp: DateTime<Utc>,
        content: String,
        topic: Option<String>,
        question_type: QuestionKind,
    },
    Response {
        timestamp: DateTime<Utc>,
        content: String,
    },
}

impl TranscriptEntry {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TranscriptEntry::Question { timestamp, .. } | TranscriptEntry::Response { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: String,
    pub candidate_name: String,
    pub job_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub conversation: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedFeedback {
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub overall_assessment: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub session_id: String,
    pub candidate_name: String,
    pub job_title: String,
    pub evaluation_date: DateTime<Utc>,
    pub scores: IndexMap<String, f64>,
    pub total_questions: usize,
    pub total_responses: usize,
    pub interview_duration_secs: u64,
    pub phases_completed: Phase,
    pub detailed_feedback: DetailedFeedback,
    pub topic_coverage: Option<CoverageReport>,
    pub evaluation_history: Vec<Evaluation>,
    pub performance_trend: Trend,
}

/// Short status view of the active session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub candidate_name: String,
    pub job_title: String,
    pub current_phase: Phase,
    pub current_topic: Option<String>,
    pub questions_asked: usize,
    pub time_remaining: u64,
    pub is_active: bool,
    pub scores: IndexMap<String, f64>,
}
