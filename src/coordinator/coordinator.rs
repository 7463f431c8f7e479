//! Interview coordinator
//!
//! Runs the turn protocol: score the last answer, update topic depth, refresh
//! the shared context, then ask the strategist for the next question. Also
//! owns the phase state machine and the end-of-interview sequence.

use super::commands::{Command, HELP_TEXT};
use super::events::{EventLog, EventType, WorkflowEvent};
use super::shared_context::{
    ContextBus, ContextHandle, ContextWrite, ContextWriter, DocumentFacts, GuidanceState, Owner,
};
use crate::config::Config;
use crate::documents::models::{
    Importance, JobPosting, RequirementCategory, ResumeProfile, SkillMatch,
};
use crate::documents::parser::DocumentAnalyzer;
use crate::error::{InterviewError, Result};
use crate::metrics::METRICS;
use crate::planner::models::{
    CoverageReport, CoverageStatus, Depth, DepthDecision, NextTopic, TimeAction, TopicCategory,
    TransitionAdvice,
};
use crate::planner::topic_planner::TopicPlanner;
use crate::scoring::models::{Assessment, Dimension, Evaluation};
use crate::scoring::scorer::ResponseScorer;
use crate::session::models::{EvaluationReport, Phase, QuestionKind, SessionSummary};
use crate::session::store::SessionStore;
use crate::session::timers::{SessionTimers, WarningEvent};
use crate::strategist::generator::TextGenerator;
use crate::strategist::strategist::{
    GeneratedQuestion, PromptContext, QuestionRequest, QuestionStrategist,
};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const MAX_FOCUS_AREAS: usize = 5;

/// Result of one candidate turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Next question; `None` once the interview is over
    pub question: Option<GeneratedQuestion>,
    pub evaluation: Option<Evaluation>,
    pub depth: Option<DepthDecision>,
    pub phase: Phase,
    pub report: Option<EvaluationReport>,
    pub timed_out: bool,
}

impl TurnOutcome {
    pub fn is_finished(&self) -> bool {
        self.question.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum CommandOutcome {
    Turn(Box<TurnOutcome>),
    Status(SessionSummary),
    Saved,
    Help(&'static str),
    Ended(Option<Box<EvaluationReport>>),
    Transitioned {
        next: NextTopic,
        question: Option<GeneratedQuestion>,
    },
    PhaseAdvanced(Phase),
    Coverage(CoverageReport),
}

#[derive(Debug, Clone)]
struct PendingQuestion {
    text: String,
    kind: QuestionKind,
    topic: Option<String>,
    category: TopicCategory,
}

pub struct InterviewCoordinator {
    config: Config,
    store: Arc<SessionStore>,
    analyzer: DocumentAnalyzer,
    planner: TopicPlanner,
    scorer: Option<ResponseScorer>,
    strategist: QuestionStrategist,
    context: ContextHandle,
    guidance: ContextWriter,
    events: EventLog,
    timers: Option<SessionTimers>,
    warnings: Option<mpsc::Sender<WarningEvent>>,
    pending: Option<PendingQuestion>,
    prompt_context: PromptContext,
}

impl InterviewCoordinator {
    /// Must be called inside a tokio runtime; spawns the context bus
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let (context, _bus) = ContextBus::spawn();
        let store = Arc::new(
            SessionStore::new(config.session.clone()).with_context(context.writer(Owner::Session)),
        );
        let strategist = QuestionStrategist::new(
            generator,
            store.clone(),
            config.generation.temperatures.interviewer,
            config.generation.streaming,
        );
        let planner = TopicPlanner::new(config.planner.clone());

        Self {
            config,
            store,
            analyzer: DocumentAnalyzer::new().with_context(context.writer(Owner::Documents)),
            planner,
            scorer: None,
            strategist,
            guidance: context.writer(Owner::Coordinator),
            context,
            events: EventLog::default(),
            timers: None,
            warnings: None,
            pending: None,
            prompt_context: PromptContext::default(),
        }
    }

    /// Deliver timeout warnings to `tx` for sessions started afterwards
    pub fn with_warnings(mut self, tx: mpsc::Sender<WarningEvent>) -> Self {
        self.warnings = Some(tx);
        self
    }

    pub fn store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }

    pub fn context(&self) -> ContextHandle {
        self.context.clone()
    }

    pub fn planner(&self) -> &TopicPlanner {
        &self.planner
    }

    pub fn scorer(&self) -> Option<&ResponseScorer> {
        self.scorer.as_ref()
    }

    pub fn event_log(&self) -> &[WorkflowEvent] {
        self.events.events()
    }

    pub fn pending_question(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.text.as_str())
    }

    /// Parse both documents and start the interview. Parse failures abort.
    pub async fn start(
        &mut self,
        job_path: impl AsRef<Path>,
        resume_path: impl AsRef<Path>,
    ) -> Result<GeneratedQuestion> {
        let job = self.analyzer.parse_job_posting(job_path).await?;
        let resume = self.analyzer.parse_candidate_profile(resume_path).await?;
        self.start_with_documents(job, resume).await
    }

    /// Start a session from parsed documents and return the opening question
    pub async fn start_with_documents(
        &mut self,
        job: JobPosting,
        resume: ResumeProfile,
    ) -> Result<GeneratedQuestion> {
        if let Some(timers) = self.timers.take() {
            timers.shutdown().await;
        }

        let skill_match = self.analyzer.match_skills(&job, &resume);
        let focus = focus_areas(&job, &skill_match);
        let candidate = if resume.name.trim().is_empty() {
            "Candidate".to_string()
        } else {
            resume.name.clone()
        };

        let session_id = self.store.create(&candidate, &job.title).await?;
        self.scorer = Some(
            ResponseScorer::new(candidate.clone()).with_context(self.context.writer(Owner::Scorer)),
        );
        let plan = self
            .planner
            .plan_sequence(&job.requirements, self.config.planner.duration_minutes);
        self.prompt_context = PromptContext::from_documents(Some(&job), Some(&resume));

        let facts = DocumentFacts {
            job_posting: job,
            resume,
            skill_match,
            focus_areas: focus.clone(),
        };
        self.analyzer.publish(facts).await?;
        self.sync_guidance().await?;
        self.store.publish_lifecycle().await?;

        let topics: Vec<&str> = plan.iter().map(|n| n.name.as_str()).collect();
        info!("Interview {} started with {} planned topics", session_id, topics.len());
        self.events.record(
            EventType::InterviewStarted,
            json!({
                "session_id": session_id,
                "candidate": candidate,
                "topics": topics,
                "focus_areas": focus,
            }),
        );

        self.timers = Some(SessionTimers::spawn(
            self.store.clone(),
            self.config.session.autosave_interval(),
            self.warnings.clone(),
        ));

        let question = self.strategist.opening_question().await?;
        self.set_pending(&question, TopicCategory::Behavioral);
        Ok(question)
    }

    /// One full cycle: evaluate the answer to the pending question, steer
    /// topic and phase, and produce the next question.
    pub async fn take_turn(&mut self, response: &str) -> Result<TurnOutcome> {
        if !self.store.is_active().await {
            return Err(InterviewError::NoActiveSession);
        }

        if self.store.is_timed_out().await {
            warn!("Session timed out, ending interview");
            let report = self.end_interview().await?;
            return Ok(TurnOutcome {
                question: None,
                evaluation: None,
                depth: None,
                phase: self.current_phase().await,
                report,
                timed_out: true,
            });
        }

        let phase = self
            .store
            .current_phase()
            .await
            .ok_or(InterviewError::NoActiveSession)?;
        let pending = self.pending.take();
        self.events.record(
            EventType::ResponseRecorded,
            json!({
                "phase": phase,
                "words": response.split_whitespace().count(),
            }),
        );

        if phase >= Phase::Conclusion {
            self.store.record_response(response, None).await?;
            let phase = self.advance_to(Phase::Complete).await?;
            let report = self.end_interview().await?;
            return Ok(TurnOutcome {
                question: None,
                evaluation: None,
                depth: None,
                phase,
                report,
                timed_out: false,
            });
        }

        let previous_kind = pending.as_ref().map(|p| p.kind);
        let (evaluation, depth) = match pending {
            Some(ref pending) => {
                let (evaluation, depth) = self.evaluate_response(pending, response).await?;
                (Some(evaluation), depth)
            }
            None => {
                self.store.record_response(response, None).await?;
                (None, None)
            }
        };

        let mut topic_changed = false;
        if phase == Phase::Introduction {
            self.advance_to(Phase::Technical).await?;
            let entered = self.store.summary().await.and_then(|s| s.current_topic);
            if let Some(topic) = self.planner.current_topic().map(str::to_string) {
                if entered.as_deref() != Some(topic.as_str()) {
                    self.enter_topic(entered, topic).await?;
                    topic_changed = true;
                }
            }
        } else {
            let guidance = self.planner.guidance()?;
            if guidance.transition == TransitionAdvice::Transition {
                let status = coverage_for(guidance.current_depth);
                if let NextTopic::Exhausted = self.transition_topic(status).await? {
                    return self.conclude(evaluation, depth).await;
                }
                topic_changed = true;
            }
        }

        if self.planner.current_topic().is_none() {
            return self.conclude(evaluation, depth).await;
        }

        self.sync_guidance().await?;
        self.store.publish_lifecycle().await?;

        let needs_follow_up = self
            .scorer
            .as_ref()
            .map(|s| s.performance_insights().needs_follow_up)
            .unwrap_or(false);
        let follow_up = !topic_changed
            && needs_follow_up
            && evaluation.is_some()
            && previous_kind != Some(QuestionKind::FollowUp);

        let question = if follow_up {
            let question = self.strategist.generate_follow_up(response).await?;
            let category = self.current_category();
            self.set_pending(&question, category);
            question
        } else {
            let feedback = evaluation.as_ref().map(|e| e.feedback.as_str()).unwrap_or("");
            self.ask_topic_question(topic_changed, feedback, response).await?
        };

        Ok(TurnOutcome {
            question: Some(question),
            evaluation,
            depth,
            phase: self.current_phase().await,
            report: None,
            timed_out: false,
        })
    }

    async fn evaluate_response(
        &mut self,
        pending: &PendingQuestion,
        response: &str,
    ) -> Result<(Evaluation, Option<DepthDecision>)> {
        let scorer = self.scorer.as_mut().ok_or(InterviewError::NoActiveSession)?;
        let topic = pending
            .topic
            .clone()
            .unwrap_or_else(|| "Introduction".to_string());

        let evaluation = scorer.evaluate(response, &pending.text, &topic, pending.category);
        let scores = session_scores(&scorer.current_assessment());

        self.store
            .record_response(response, Some(evaluation.clone()))
            .await?;
        self.store.record_evaluation(evaluation.clone()).await?;
        self.store.update_scores(scores).await?;

        let depth = match pending.topic.as_deref() {
            Some(topic) if self.planner.topic(topic).is_some() => {
                let minutes = (self.store.time_remaining().await / 60) as u32;
                self.planner.set_time_remaining(minutes);
                Some(self.planner.evaluate_depth(
                    topic,
                    evaluation.quality(),
                    evaluation.analysis.word_count,
                )?)
            }
            _ => None,
        };

        if let Some(ref scorer) = self.scorer {
            scorer
                .publish_insights(Some(evaluation.feedback.clone()))
                .await?;
        }

        self.events.record(
            EventType::ResponseEvaluated,
            json!({
                "topic": topic,
                "overall_score": evaluation.overall_score,
                "confidence": evaluation.confidence,
                "advance": depth.as_ref().map(|d| d.advance),
            }),
        );

        Ok((evaluation, depth))
    }

    /// Move off the current topic. `Incomplete` leaves it uncovered.
    pub async fn transition_topic(&mut self, status: CoverageStatus) -> Result<NextTopic> {
        let current = self.planner.current_topic().map(str::to_string);

        if let Some(ref topic) = current {
            if status != CoverageStatus::Incomplete {
                self.planner.manage_time(TimeAction::EndTopic(topic.clone()))?;
            }
        }

        let next = self.planner.suggest_next_topic(current.as_deref(), status)?;
        match next {
            NextTopic::Topic(ref topic) => {
                if current.as_deref() != Some(topic.as_str()) {
                    self.enter_topic(current.clone(), topic.clone()).await?;
                }
            }
            NextTopic::Exhausted => {
                self.store.set_topic(None).await?;
                self.events.record(
                    EventType::TopicChanged,
                    json!({ "from": current, "to": null }),
                );
            }
        }

        self.store
            .update_topic_progression(self.planner.analyze_coverage()?)
            .await?;
        self.sync_guidance().await?;
        Ok(next)
    }

    async fn enter_topic(&mut self, from: Option<String>, topic: String) -> Result<()> {
        self.store.set_topic(Some(topic.clone())).await?;
        self.planner.manage_time(TimeAction::StartTopic(topic.clone()))?;
        METRICS.record_topic_transition();

        let category = self.planner.topic(&topic).map(|n| n.category);
        if matches!(
            category,
            Some(TopicCategory::Behavioral | TopicCategory::Situational)
        ) && self.current_phase().await == Phase::Technical
        {
            self.advance_to(Phase::Behavioral).await?;
        }

        info!("Topic changed to '{}'", topic);
        self.events.record(
            EventType::TopicChanged,
            json!({ "from": from, "to": topic, "category": category }),
        );
        Ok(())
    }

    /// Move to the fixed successor phase; a no-op at `Complete`
    pub async fn advance_phase(&mut self) -> Result<Phase> {
        let current = self
            .store
            .current_phase()
            .await
            .ok_or(InterviewError::NoActiveSession)?;
        let next = current.successor();

        if next != current {
            self.store.set_phase(next).await?;
            info!("Interview phase advanced from {} to {}", current, next);
            self.events.record(
                EventType::PhaseChanged,
                json!({ "from": current, "to": next }),
            );
            self.store.publish_lifecycle().await?;
        }
        Ok(next)
    }

    /// Step forward one phase at a time until `target` is reached
    async fn advance_to(&mut self, target: Phase) -> Result<Phase> {
        let mut phase = self.current_phase().await;
        while phase < target {
            phase = self.advance_phase().await?;
        }
        Ok(phase)
    }

    async fn current_phase(&self) -> Phase {
        self.store
            .current_phase()
            .await
            .unwrap_or(Phase::Introduction)
    }

    fn current_category(&self) -> TopicCategory {
        self.planner
            .current_topic()
            .and_then(|t| self.planner.topic(t))
            .map(|n| n.category)
            .unwrap_or(TopicCategory::Technical)
    }

    async fn ask_topic_question(
        &mut self,
        topic_changed: bool,
        feedback: &str,
        response: &str,
    ) -> Result<GeneratedQuestion> {
        let snapshot = self.context.snapshot().await?;
        let guidance = &snapshot.guidance;

        let transition_hint = match guidance.transition {
            Some(TransitionAdvice::Transition) => "transition",
            _ => "",
        };
        let adjustment = QuestionStrategist::adapt_strategy(feedback, transition_hint, response);
        if !adjustment.notes.is_empty() {
            debug!("Questioning strategy adapted: {}", adjustment.notes.join("; "));
        }

        let category = guidance
            .topic_category
            .unwrap_or(TopicCategory::Technical);
        let request = QuestionRequest {
            category,
            topic: guidance.current_topic.clone(),
            depth: guidance.suggested_depth,
            difficulty: adjustment
                .difficulty
                .unwrap_or(snapshot.performance.insights.suggested_difficulty),
            transition: topic_changed,
        };

        let question = self
            .strategist
            .generate_question(&self.prompt_context, &request)
            .await?;
        self.set_pending(&question, category);
        Ok(question)
    }

    async fn conclude(
        &mut self,
        evaluation: Option<Evaluation>,
        depth: Option<DepthDecision>,
    ) -> Result<TurnOutcome> {
        let question = self.ask_closing().await?;
        Ok(TurnOutcome {
            question: Some(question),
            evaluation,
            depth,
            phase: self.current_phase().await,
            report: None,
            timed_out: false,
        })
    }

    async fn ask_closing(&mut self) -> Result<GeneratedQuestion> {
        self.advance_to(Phase::Conclusion).await?;
        self.sync_guidance().await?;
        let question = self.strategist.closing_question().await?;
        self.set_pending(&question, TopicCategory::Behavioral);
        Ok(question)
    }

    fn set_pending(&mut self, question: &GeneratedQuestion, category: TopicCategory) {
        self.events.record(
            EventType::QuestionAsked,
            json!({
                "question": question.text,
                "kind": question.kind,
                "topic": question.topic,
                "source": question.source,
            }),
        );
        self.pending = Some(PendingQuestion {
            text: question.text.clone(),
            kind: question.kind,
            topic: question.topic.clone().or_else(|| {
                (question.kind == QuestionKind::FollowUp)
                    .then(|| self.planner.current_topic().map(str::to_string))
                    .flatten()
            }),
            category,
        });
    }

    async fn sync_guidance(&self) -> Result<()> {
        let guidance = match self.planner.guidance() {
            Ok(guidance) => guidance,
            Err(InterviewError::NotPlanned) => return Ok(()),
            Err(e) => return Err(e),
        };

        let topics = self.planner.topics();
        let completed_topics = topics
            .values()
            .filter(|n| n.covered)
            .map(|n| n.name.clone())
            .collect();
        let pending_topics = self
            .planner
            .flow()
            .map(|flow| {
                flow.sequence
                    .iter()
                    .filter(|name| topics.get(*name).map_or(false, |n| !n.covered))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let state = GuidanceState {
            current_topic: guidance.current_topic,
            topic_category: guidance.category,
            suggested_depth: guidance.suggested_depth,
            transition: Some(guidance.transition),
            time_status: Some(guidance.time_status),
            completed_topics,
            pending_topics,
        };
        self.guidance.write(ContextWrite::Guidance(state)).await?;
        Ok(())
    }

    /// Final aggregation: scores, then coverage, then close the session.
    /// Returns `None` when no session was started.
    pub async fn end_interview(&mut self) -> Result<Option<EvaluationReport>> {
        if self.store.session_id().await.is_none() {
            return Ok(None);
        }

        if let Some(ref scorer) = self.scorer {
            self.store
                .update_scores(session_scores(&scorer.current_assessment()))
                .await?;
        }

        match self.planner.analyze_coverage() {
            Ok(coverage) => self.store.update_topic_progression(coverage).await?,
            Err(InterviewError::NotPlanned) => debug!("No topic plan to snapshot"),
            Err(e) => return Err(e),
        }

        let report = self.store.end().await;

        if let Some(timers) = self.timers.take() {
            timers.shutdown().await;
        }
        self.pending = None;
        self.store.publish_lifecycle().await?;

        self.events.record(
            EventType::InterviewEnded,
            json!({
                "overall_score": report.as_ref().and_then(|r| r.scores.get("overall").copied()),
                "questions": report.as_ref().map(|r| r.total_questions),
                "trend": report.as_ref().map(|r| r.performance_trend),
            }),
        );
        Ok(report)
    }

    /// Execute one typed command
    pub async fn dispatch(&mut self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::Respond(text) => {
                let outcome = self.take_turn(&text).await?;
                Ok(CommandOutcome::Turn(Box::new(outcome)))
            }
            Command::Status => self
                .store
                .summary()
                .await
                .map(CommandOutcome::Status)
                .ok_or(InterviewError::NoActiveSession),
            Command::Save => {
                self.store.save().await;
                Ok(CommandOutcome::Saved)
            }
            Command::Help => Ok(CommandOutcome::Help(HELP_TEXT)),
            Command::End => {
                let report = self.end_interview().await?;
                Ok(CommandOutcome::Ended(report.map(Box::new)))
            }
            Command::Transition(status) => {
                if !self.store.is_active().await {
                    return Err(InterviewError::NoActiveSession);
                }
                let previous = self.planner.current_topic().map(str::to_string);
                let next = self.transition_topic(status).await?;
                let question = match next {
                    NextTopic::Topic(ref topic) => {
                        let changed = previous.as_deref() != Some(topic.as_str());
                        Some(self.ask_topic_question(changed, "", "").await?)
                    }
                    NextTopic::Exhausted => Some(self.ask_closing().await?),
                };
                Ok(CommandOutcome::Transitioned { next, question })
            }
            Command::AdvancePhase => Ok(CommandOutcome::PhaseAdvanced(self.advance_phase().await?)),
            Command::Coverage => Ok(CommandOutcome::Coverage(self.planner.analyze_coverage()?)),
        }
    }
}

/// Coverage status of a topic being left because its question cap was hit
fn coverage_for(depth: Option<Depth>) -> CoverageStatus {
    match depth {
        Some(Depth::Medium | Depth::Deep) => CoverageStatus::Complete,
        _ => CoverageStatus::Partial,
    }
}

/// Session score map entries derived from an assessment
fn session_scores(assessment: &Assessment) -> IndexMap<String, f64> {
    let mut scores: IndexMap<String, f64> = [
        Dimension::TechnicalKnowledge,
        Dimension::CommunicationSkills,
        Dimension::ProblemSolving,
    ]
    .iter()
    .map(|d| {
        let score = assessment.dimension_scores.get(d).copied().unwrap_or(0.0);
        (d.as_str().to_string(), score)
    })
    .collect();
    scores.insert("overall".to_string(), assessment.overall_score);
    scores
}

/// Areas the interview should concentrate on, at most five
pub fn focus_areas(job: &JobPosting, skills: &SkillMatch) -> Vec<String> {
    let mut areas = IndexSet::new();

    for requirement in &job.requirements {
        match requirement.category {
            RequirementCategory::TechnicalSkill if requirement.importance != Importance::Low => {
                areas.insert(requirement.text.clone());
            }
            RequirementCategory::SystemDesign => {
                areas.insert("System Design".to_string());
            }
            RequirementCategory::Leadership => {
                areas.insert("Leadership Experience".to_string());
            }
            _ => {}
        }
    }

    for skill in skills.missing_skills.iter().take(2) {
        areas.insert(format!("Knowledge of {}", skill));
    }

    if job
        .requirements
        .iter()
        .any(|r| r.text.to_lowercase().contains("experience"))
    {
        areas.insert("Professional Experience".to_string());
    }

    areas.into_iter().take(MAX_FOCUS_AREAS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::documents::models::Requirement;
    use crate::strategist::generator::TemplateGenerator;
    use tempfile::TempDir;

    fn job() -> JobPosting {
        JobPosting {
            title: "Senior Backend Engineer".to_string(),
            company: "Acme".to_string(),
            requirements: vec![
                Requirement::new(RequirementCategory::TechnicalSkill, "Python", Importance::High),
                Requirement::new(RequirementCategory::SystemDesign, "Distributed systems design", Importance::Medium),
                Requirement::new(RequirementCategory::Experience, "5+ years experience", Importance::High),
            ],
            responsibilities: vec!["Build services".to_string()],
        }
    }

    fn resume() -> ResumeProfile {
        ResumeProfile {
            name: "Ada Lovelace".to_string(),
            title: "Software Engineer".to_string(),
            skills: vec!["Python".to_string(), "SQL".to_string()],
            ..ResumeProfile::default()
        }
    }

    fn coordinator_in(dir: &TempDir) -> InterviewCoordinator {
        let config = Config {
            session: SessionConfig {
                data_dir: dir.path().to_path_buf(),
                ..SessionConfig::default()
            },
            ..Config::default()
        };
        InterviewCoordinator::new(config, Arc::new(TemplateGenerator))
    }

    #[test]
    fn test_focus_areas() {
        let skills = SkillMatch {
            missing_skills: vec!["Go".to_string(), "Rust".to_string(), "Java".to_string()],
            ..SkillMatch::default()
        };
        let areas = focus_areas(&job(), &skills);
        assert_eq!(
            areas,
            vec![
                "Python",
                "System Design",
                "Knowledge of Go",
                "Knowledge of Rust",
                "Professional Experience"
            ]
        );
    }

    #[test]
    fn test_coverage_for_depth() {
        assert_eq!(coverage_for(Some(Depth::Deep)), CoverageStatus::Complete);
        assert_eq!(coverage_for(Some(Depth::Medium)), CoverageStatus::Complete);
        assert_eq!(coverage_for(Some(Depth::Surface)), CoverageStatus::Partial);
        assert_eq!(coverage_for(None), CoverageStatus::Partial);
    }

    #[tokio::test]
    async fn test_turn_requires_started_session() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator_in(&dir);
        let err = coordinator.take_turn("hello").await.unwrap_err();
        assert!(matches!(err, InterviewError::NoActiveSession));
        assert!(coordinator.end_interview().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_plans_and_asks_opening() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator_in(&dir);

        let opening = coordinator.start_with_documents(job(), resume()).await.unwrap();
        assert_eq!(opening.kind, QuestionKind::Introduction);
        assert_eq!(coordinator.planner().current_topic(), Some("Python"));

        let context = coordinator.context().snapshot().await.unwrap();
        assert!(context.documents.is_some());
        assert_eq!(context.guidance.current_topic.as_deref(), Some("Python"));
        assert_eq!(context.lifecycle.phase, Some(Phase::Introduction));

        coordinator.end_interview().await.unwrap();
    }

    #[tokio::test]
    async fn test_first_response_moves_to_technical() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator_in(&dir);
        coordinator.start_with_documents(job(), resume()).await.unwrap();

        let outcome = coordinator
            .take_turn("I have spent six years building Python services and APIs for payments.")
            .await
            .unwrap();

        assert_eq!(outcome.phase, Phase::Technical);
        assert!(outcome.evaluation.is_some());
        let question = outcome.question.unwrap();
        assert_eq!(question.kind, QuestionKind::Technical);
        assert_eq!(question.topic.as_deref(), Some("Python"));

        let session = coordinator.store().snapshot().await.unwrap();
        assert_eq!(session.current_topic.as_deref(), Some("Python"));
        assert_eq!(session.evaluation_history.len(), 1);
        assert!(session.scores["overall"] > 0.0);

        let context = coordinator.context().snapshot().await.unwrap();
        assert_eq!(context.performance.evaluation_count, 1);
        assert!(context.performance.latest_feedback.is_some());
        assert_eq!(context.lifecycle.phase, Some(Phase::Technical));

        coordinator.end_interview().await.unwrap();
    }

    #[tokio::test]
    async fn test_advance_phase_is_forward_only() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator_in(&dir);
        coordinator.start_with_documents(job(), resume()).await.unwrap();

        for expected in [
            Phase::Technical,
            Phase::Behavioral,
            Phase::Conclusion,
            Phase::Complete,
            Phase::Complete,
        ] {
            assert_eq!(coordinator.advance_phase().await.unwrap(), expected);
        }

        let phase_events = coordinator
            .event_log()
            .iter()
            .filter(|e| e.event_type == EventType::PhaseChanged)
            .count();
        assert_eq!(phase_events, 4);

        coordinator.end_interview().await.unwrap();
    }

    #[tokio::test]
    async fn test_end_captures_scores_and_coverage_first() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator_in(&dir);
        coordinator.start_with_documents(job(), resume()).await.unwrap();
        coordinator
            .take_turn("I lead the backend team and design our Python services.")
            .await
            .unwrap();

        let report = coordinator.end_interview().await.unwrap().unwrap();
        assert!(report.topic_coverage.is_some());
        assert_eq!(report.total_responses, 1);
        assert!(report.scores["overall"] > 0.0);

        let store = coordinator.store();
        assert!(!store.is_active().await);
        assert!(store.evaluation_path(&report.session_id).is_file());

        let err = coordinator.take_turn("more").await.unwrap_err();
        assert!(matches!(err, InterviewError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_idle_session_ends_on_next_turn() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            session: SessionConfig {
                data_dir: dir.path().to_path_buf(),
                timeout_secs: 1,
                ..SessionConfig::default()
            },
            ..Config::default()
        };
        let mut coordinator = InterviewCoordinator::new(config, Arc::new(TemplateGenerator));
        coordinator.start_with_documents(job(), resume()).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        let outcome = coordinator
            .take_turn("Sorry, I stepped away for a moment.")
            .await
            .unwrap();

        assert!(outcome.timed_out);
        assert!(outcome.is_finished());
        assert!(outcome.evaluation.is_none());
        let report = outcome.report.unwrap();
        // the late answer is not recorded
        assert_eq!(report.total_responses, 0);

        let store = coordinator.store();
        assert!(!store.is_active().await);
        assert!(store.evaluation_path(&report.session_id).is_file());
        let context = coordinator.context().snapshot().await.unwrap();
        assert!(!context.lifecycle.is_active);

        let err = coordinator.take_turn("hello again").await.unwrap_err();
        assert!(matches!(err, InterviewError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_dispatch_commands() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator_in(&dir);
        coordinator.start_with_documents(job(), resume()).await.unwrap();

        match coordinator.dispatch(Command::parse("status")).await.unwrap() {
            CommandOutcome::Status(summary) => {
                assert_eq!(summary.candidate_name, "Ada Lovelace");
                assert_eq!(summary.questions_asked, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        match coordinator.dispatch(Command::parse("/next complete")).await.unwrap() {
            CommandOutcome::Transitioned { next, question } => {
                assert_ne!(next, NextTopic::Exhausted);
                assert!(question.is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        match coordinator.dispatch(Command::Coverage).await.unwrap() {
            CommandOutcome::Coverage(coverage) => assert_eq!(coverage.covered_count, 1),
            other => panic!("unexpected outcome: {:?}", other),
        }

        match coordinator.dispatch(Command::End).await.unwrap() {
            CommandOutcome::Ended(report) => assert!(report.is_some()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
