//! Workflow event log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    InterviewStarted,
    QuestionAsked,
    ResponseRecorded,
    ResponseEvaluated,
    PhaseChanged,
    TopicChanged,
    InterviewEnded,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::InterviewStarted => "interview_started",
            EventType::QuestionAsked => "question_asked",
            EventType::ResponseRecorded => "response_recorded",
            EventType::ResponseEvaluated => "response_evaluated",
            EventType::PhaseChanged => "phase_changed",
            EventType::TopicChanged => "topic_changed",
            EventType::InterviewEnded => "interview_ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub data: serde_json::Value,
}

/// Append-only record of what happened during the interview
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<WorkflowEvent>,
}

impl EventLog {
    pub fn record(&mut self, event_type: EventType, data: serde_json::Value) {
        info!("Workflow event: {}", event_type.as_str());
        self.events.push(WorkflowEvent {
            timestamp: Utc::now(),
            event_type,
            data,
        });
    }

    pub fn events(&self) -> &[WorkflowEvent] {
        &self.events
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
