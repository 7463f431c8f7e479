//! Job posting and resume analysis

pub mod models;
pub mod parser;

pub use models::{
    Importance, JobPosting, Requirement, RequirementCategory, ResumeProfile, SkillMatch,
};
pub use parser::DocumentAnalyzer;
