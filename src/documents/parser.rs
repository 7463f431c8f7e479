//! Line-heuristic parsing of job postings and resumes

use super::models::*;
use crate::coordinator::shared_context::{ContextWrite, ContextWriter, DocumentFacts};
use crate::error::{InterviewError, Result};
use indexmap::IndexSet;
use std::path::Path;
use tracing::{debug, info};

const ROLE_WORDS: &[&str] = &["engineer", "developer", "manager", "analyst"];

/// Turns raw job-posting and resume text into structured records.
///
/// Parsing never fails on present-but-odd content; missing fields come back
/// empty. Only an unreadable file is an error.
#[derive(Debug, Clone, Default)]
pub struct DocumentAnalyzer {
    context: Option<ContextWriter>,
}

impl DocumentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish document facts through `writer`
    pub fn with_context(mut self, writer: ContextWriter) -> Self {
        self.context = Some(writer);
        self
    }

    /// Replace the documents key group. A no-op without a context writer.
    pub async fn publish(&self, facts: DocumentFacts) -> Result<()> {
        let Some(ref writer) = self.context else {
            return Ok(());
        };
        debug!(
            "Publishing documents for '{}' with {} focus areas",
            facts.job_posting.title,
            facts.focus_areas.len()
        );
        writer.write(ContextWrite::Documents(Box::new(facts))).await?;
        Ok(())
    }

    /// Read and parse a job posting file
    pub async fn parse_job_posting(&self, path: impl AsRef<Path>) -> Result<JobPosting> {
        let content = read_document(path.as_ref()).await?;
        let posting = self.parse_job_posting_text(&content);
        info!(
            "Parsed job posting '{}' with {} requirements",
            posting.title,
            posting.requirements.len()
        );
        Ok(posting)
    }

    /// Read and parse a resume file
    pub async fn parse_candidate_profile(&self, path: impl AsRef<Path>) -> Result<ResumeProfile> {
        let content = read_document(path.as_ref()).await?;
        let profile = self.parse_candidate_profile_text(&content);
        info!("Parsed resume for '{}' with {} skills", profile.name, profile.skills.len());
        Ok(profile)
    }

    pub fn parse_job_posting_text(&self, content: &str) -> JobPosting {
        #[derive(PartialEq)]
        enum Section {
            None,
            Requirements,
            Responsibilities,
        }

        let mut posting = JobPosting::default();
        let mut section = Section::None;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let lower = line.to_lowercase();

            if posting.title.is_empty() && ROLE_WORDS.iter().any(|w| lower.contains(w)) {
                posting.title = line.to_string();
            } else if let Some(company) = line.strip_prefix("Company:") {
                posting.company = company.trim().to_string();
            } else if lower.starts_with("requirements") {
                section = Section::Requirements;
            } else if lower.starts_with("responsibilities") {
                section = Section::Responsibilities;
            } else if let Some(item) = line.strip_prefix("- ") {
                match section {
                    Section::Requirements => posting.requirements.push(Requirement::new(
                        categorize_requirement(item),
                        item,
                        assess_importance(item),
                    )),
                    Section::Responsibilities => posting.responsibilities.push(item.to_string()),
                    Section::None => {}
                }
            }
        }

        posting
    }

    pub fn parse_candidate_profile_text(&self, content: &str) -> ResumeProfile {
        let mut profile = ResumeProfile::default();

        for (i, line) in content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
        {
            let lower = line.to_lowercase();

            if i == 0 && !line.chars().any(|c| c.is_ascii_digit()) {
                profile.name = line.to_string();
            } else if i == 1 && ROLE_WORDS.iter().any(|w| lower.contains(w)) {
                profile.title = line.to_string();
            } else if lower.contains("years") && lower.contains("experience") {
                profile.experience_summary = line.to_string();
            } else if line.contains("Skills:") || line.contains("Technologies:") {
                let list = line.split_once(':').map(|(_, rest)| rest).unwrap_or(line);
                profile.skills = list
                    .split([',', ';'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            } else if let Some(item) = line.strip_prefix("- ") {
                if ["Corp", "Company", ":"].iter().any(|k| line.contains(k)) {
                    profile.history.push(item.to_string());
                }
            } else if line.contains("Education:") || line.contains("University") || line.contains("College") {
                profile.education = line.to_string();
            }
        }

        profile
    }

    /// Compare the posting's technical skills against the resume.
    ///
    /// A job skill matches when any resume skill occurs in it, case-insensitively.
    pub fn match_skills(&self, posting: &JobPosting, profile: &ResumeProfile) -> SkillMatch {
        let job_skills: IndexSet<String> = posting
            .requirements
            .iter()
            .filter(|r| r.category == RequirementCategory::TechnicalSkill)
            .map(|r| r.text.to_lowercase())
            .collect();
        let resume_skills: IndexSet<String> =
            profile.skills.iter().map(|s| s.to_lowercase()).collect();

        let mut matching = Vec::new();
        let mut missing = Vec::new();
        for job_skill in &job_skills {
            if resume_skills.iter().any(|s| job_skill.contains(s.as_str())) {
                matching.push(job_skill.clone());
            } else {
                missing.push(job_skill.clone());
            }
        }

        let additional: Vec<String> = resume_skills
            .iter()
            .filter(|s| !job_skills.iter().any(|j| j.contains(s.as_str())))
            .cloned()
            .collect();

        let match_percentage = if job_skills.is_empty() {
            0.0
        } else {
            matching.len() as f64 / job_skills.len() as f64 * 100.0
        };

        debug!(
            "Skill match: {} matching, {} missing ({:.0}%)",
            matching.len(),
            missing.len(),
            match_percentage
        );

        SkillMatch {
            matching_skills: matching,
            missing_skills: missing,
            additional_skills: additional,
            match_percentage,
        }
    }
}

async fn read_document(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| InterviewError::Parse(format!("{}: {}", path.display(), e)))
}

/// Keyword-based requirement category, first match wins
pub fn categorize_requirement(text: &str) -> RequirementCategory {
    let lower = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["python", "java", "javascript", "c++", "sql"]) {
        RequirementCategory::TechnicalSkill
    } else if has(&["years", "experience"]) {
        RequirementCategory::Experience
    } else if has(&["aws", "cloud", "docker", "kubernetes"]) {
        RequirementCategory::Infrastructure
    } else if has(&["design", "architecture", "system"]) {
        RequirementCategory::SystemDesign
    } else if has(&["leadership", "mentor", "manage"]) {
        RequirementCategory::Leadership
    } else {
        RequirementCategory::General
    }
}

pub fn assess_importance(text: &str) -> Importance {
    let lower = text.to_lowercase();
    if ["required", "must", "essential"].iter().any(|w| lower.contains(w)) {
        Importance::High
    } else if ["preferred", "nice", "bonus"].iter().any(|w| lower.contains(w)) {
        Importance::Low
    } else {
        Importance::Medium
    }
}
