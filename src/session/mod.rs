//! Interview session lifecycle
//!
//! Session state, JSON persistence, and the autosave/timeout background tasks.

pub mod models;
pub mod store;
pub mod timers;

pub use models::{
    DetailedFeedback, EvaluationReport, Phase, QuestionKind, QuestionRecord, ResponseRecord,
    Session, SessionSummary, Transcript, TranscriptEntry,
};
pub use store::SessionStore;
pub use timers::{warning_schedule, SessionTimers, TimeoutWarning, WarningEvent};
