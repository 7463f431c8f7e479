//! Interview Coordinator
//!
//! Runs a simulated technical interview from a job posting and a resume:
//! topic planning, heuristic response scoring, adaptive question generation,
//! and JSON session persistence.

pub mod config;
pub mod coordinator;
pub mod documents;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod planner;
pub mod scoring;
pub mod session;
pub mod strategist;

pub use config::Config;
pub use coordinator::{Command, CommandOutcome, InterviewCoordinator, TurnOutcome};
pub use error::{InterviewError, Result};
