//! Topic planning
//!
//! Turns job requirements into a prioritized, time-boxed topic sequence and
//! tracks per-topic coverage and depth as the interview progresses.

pub mod models;
pub mod topic_planner;

pub use models::{
    CoverageReport, CoverageStatus, Depth, DepthDecision, NextTopic, TimeAction, TimeReport,
    TimeStatus, TopicCategory, TopicFlow, TopicGuidance, TopicNode, TransitionAdvice,
};
pub use topic_planner::{TopicPlanner, BEHAVIORAL_TOPICS};
