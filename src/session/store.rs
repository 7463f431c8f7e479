//! Durable session store
//!
//! Holds the single active session behind an async lock and persists it as
//! JSON under `{data_dir}/sessions`. Ending a session also writes the
//! transcript and the evaluation report. With a context writer attached the
//! store publishes the lifecycle key group.

use super::models::{
    EvaluationReport, Phase, QuestionKind, QuestionRecord, ResponseRecord, Session, SessionSummary,
};
use crate::config::SessionConfig;
use crate::coordinator::shared_context::{ContextWrite, ContextWriter, LifecycleState};
use crate::error::{InterviewError, Result};
use crate::metrics::METRICS;
use crate::planner::models::CoverageReport;
use crate::scoring::models::Evaluation;
use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const SESSIONS_DIR: &str = "sessions";
const TRANSCRIPTS_DIR: &str = "transcripts";
const EVALUATIONS_DIR: &str = "evaluations";

pub struct SessionStore {
    config: SessionConfig,
    current: RwLock<Option<Session>>,
    context: Option<ContextWriter>,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            context: None,
        }
    }

    /// Publish lifecycle state through `writer`
    pub fn with_context(mut self, writer: ContextWriter) -> Self {
        self.context = Some(writer);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.config
            .data_dir
            .join(SESSIONS_DIR)
            .join(format!("{}.json", session_id))
    }

    pub fn transcript_path(&self, session_id: &str) -> PathBuf {
        self.config
            .data_dir
            .join(TRANSCRIPTS_DIR)
            .join(format!("{}_transcript.json", session_id))
    }

    pub fn evaluation_path(&self, session_id: &str) -> PathBuf {
        self.config
            .data_dir
            .join(EVALUATIONS_DIR)
            .join(format!("{}_evaluation.json", session_id))
    }

    async fn ensure_layout(&self) -> Result<()> {
        for dir in [SESSIONS_DIR, TRANSCRIPTS_DIR, EVALUATIONS_DIR] {
            let path = self.config.data_dir.join(dir);
            tokio::fs::create_dir_all(&path).await.map_err(|e| {
                InterviewError::Storage(format!("cannot create {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    /// Start a new session and make it current. Replaces any previous one.
    pub async fn create(&self, candidate_name: &str, job_title: &str) -> Result<String> {
        self.ensure_layout().await?;

        let now = Utc::now();
        let session = Session::new(Session::id_for(now), candidate_name, job_title, now);
        let session_id = session.session_id.clone();

        *self.current.write().await = Some(session);
        info!("Created interview session {} for {}", session_id, candidate_name);

        self.save().await;
        Ok(session_id)
    }

    /// Load a stored session and make it current. Missing or malformed
    /// files leave the store unchanged.
    pub async fn load(&self, session_id: &str) -> bool {
        let path = self.session_path(session_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Session file for {} not readable: {}", session_id, e);
                return false;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                *self.current.write().await = Some(session);
                info!("Loaded interview session {}", session_id);
                true
            }
            Err(e) => {
                warn!("Session file for {} is malformed: {}", session_id, e);
                false
            }
        }
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        tokio::fs::write(path, body).await?;
        Ok(())
    }

    /// Write the current session snapshot. Failures are logged, never raised.
    pub async fn save(&self) {
        let Some(session) = self.snapshot().await else {
            return;
        };
        let path = self.session_path(&session.session_id);

        match Self::write_json(&path, &session).await {
            Ok(()) => {
                debug!("Session {} saved", session.session_id);
                METRICS.record_save(true);
            }
            Err(e) => {
                warn!("Failed to save session {}: {}", session.session_id, e);
                METRICS.record_save(false);
            }
        }
    }

    /// Apply a mutation to the current session and bump its activity time
    async fn mutate<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Session),
    {
        let mut guard = self.current.write().await;
        let session = guard.as_mut().ok_or(InterviewError::NoActiveSession)?;
        f(session);
        session.touch(Utc::now());
        Ok(())
    }

    pub async fn record_question(&self, question: &str, kind: QuestionKind) -> Result<()> {
        self.mutate(|s| {
            let record = QuestionRecord {
                question: question.to_string(),
                kind,
                topic: s.current_topic.clone(),
                timestamp: Utc::now(),
            };
            s.questions.push(record);
        })
        .await?;
        METRICS.record_question(kind.as_str());
        Ok(())
    }

    pub async fn record_response(&self, response: &str, evaluation: Option<Evaluation>) -> Result<()> {
        self.mutate(|s| {
            s.responses.push(ResponseRecord {
                response: response.to_string(),
                timestamp: Utc::now(),
                evaluation,
            });
        })
        .await?;
        METRICS.record_response();
        Ok(())
    }

    pub async fn record_evaluation(&self, evaluation: Evaluation) -> Result<()> {
        self.mutate(|s| s.evaluation_history.push(evaluation)).await
    }

    /// Merge scores into the score map, keeping unrelated keys
    pub async fn update_scores(&self, scores: IndexMap<String, f64>) -> Result<()> {
        self.mutate(|s| s.scores.extend(scores)).await
    }

    pub async fn set_phase(&self, phase: Phase) -> Result<()> {
        self.mutate(|s| s.current_phase = phase).await?;
        METRICS.record_phase(phase.as_str());
        Ok(())
    }

    pub async fn set_topic(&self, topic: Option<String>) -> Result<()> {
        self.mutate(|s| s.current_topic = topic).await
    }

    pub async fn update_topic_progression(&self, report: CoverageReport) -> Result<()> {
        self.mutate(|s| s.topic_progression = Some(report)).await
    }

    pub async fn snapshot(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn session_id(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.session_id.clone())
    }

    pub async fn is_active(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.is_active)
            .unwrap_or(false)
    }

    pub async fn current_phase(&self) -> Option<Phase> {
        self.current.read().await.as_ref().map(|s| s.current_phase)
    }

    pub async fn is_timed_out(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.is_timed_out_at(Utc::now(), self.config.timeout()))
            .unwrap_or(false)
    }

    /// Seconds left in the inactivity window; zero without a session
    pub async fn time_remaining(&self) -> u64 {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.time_remaining_at(Utc::now(), self.config.timeout()))
            .unwrap_or(0)
    }

    pub async fn summary(&self) -> Option<SessionSummary> {
        let guard = self.current.read().await;
        let session = guard.as_ref()?;
        Some(SessionSummary {
            session_id: session.session_id.clone(),
            candidate_name: session.candidate_name.clone(),
            job_title: session.job_title.clone(),
            current_phase: session.current_phase,
            current_topic: session.current_topic.clone(),
            questions_asked: session.questions.len(),
            time_remaining: session.time_remaining_at(Utc::now(), self.config.timeout()),
            is_active: session.is_active,
            scores: session.scores.clone(),
        })
    }

    /// Replace the lifecycle key group with the current session state. A
    /// no-op without a context writer.
    pub async fn publish_lifecycle(&self) -> Result<()> {
        let Some(ref writer) = self.context else {
            return Ok(());
        };
        let state = match self.summary().await {
            Some(summary) => LifecycleState {
                session_id: Some(summary.session_id),
                phase: Some(summary.current_phase),
                is_active: summary.is_active,
                time_remaining_secs: summary.time_remaining,
            },
            None => LifecycleState::default(),
        };
        writer.write(ContextWrite::Lifecycle(state)).await?;
        Ok(())
    }

    /// Close the session, persist it and write the transcript and report.
    /// Returns `None` when no session exists.
    pub async fn end(&self) -> Option<EvaluationReport> {
        let session = {
            let mut guard = self.current.write().await;
            let session = guard.as_mut()?;
            session.is_active = false;
            session.clone()
        };

        self.save().await;

        let now = Utc::now();
        let transcript = session.transcript(now);
        let report = session.evaluation_report(now);

        let transcript_path = self.transcript_path(&session.session_id);
        if let Err(e) = Self::write_json(&transcript_path, &transcript).await {
            warn!("Failed to write transcript for {}: {}", session.session_id, e);
        }

        let evaluation_path = self.evaluation_path(&session.session_id);
        if let Err(e) = Self::write_json(&evaluation_path, &report).await {
            warn!("Failed to write evaluation report for {}: {}", session.session_id, e);
        }

        info!(
            "Interview session {} ended after {} questions and {} responses",
            session.session_id, report.total_questions, report.total_responses
        );

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::new(SessionConfig {
            data_dir: dir.path().to_path_buf(),
            ..SessionConfig::default()
        })
    }

    #[tokio::test]
    async fn test_create_writes_layout_and_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let id = store.create("Ada", "Backend Engineer").await.unwrap();
        assert!(id.starts_with("interview_"));
        assert!(dir.path().join("transcripts").is_dir());
        assert!(dir.path().join("evaluations").is_dir());
        assert!(store.session_path(&id).is_file());
        assert!(store.is_active().await);
    }

    #[tokio::test]
    async fn test_create_fails_when_data_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "x").unwrap();

        let store = SessionStore::new(SessionConfig {
            data_dir: blocker,
            ..SessionConfig::default()
        });
        let err = store.create("Ada", "Engineer").await.unwrap_err();
        assert!(matches!(err, InterviewError::Storage(_)));
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let id = store.create("Ada", "Engineer").await.unwrap();
        store.set_topic(Some("Rust".to_string())).await.unwrap();
        store
            .record_question("Tell me about Rust", QuestionKind::Technical)
            .await
            .unwrap();
        store.record_response("I like it", None).await.unwrap();
        store.save().await;
        let saved = store.snapshot().await.unwrap();

        let other = store_in(&dir);
        assert!(other.load(&id).await);
        assert_eq!(other.snapshot().await.unwrap(), saved);
        assert_eq!(saved.questions[0].topic.as_deref(), Some("Rust"));
    }

    #[tokio::test]
    async fn test_load_missing_or_malformed() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.load("interview_19700101_000000").await);

        store.create("Ada", "Engineer").await.unwrap();
        let before = store.snapshot().await;
        std::fs::write(store.session_path("broken"), "{not json").unwrap();
        assert!(!store.load("broken").await);
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_mutations_require_session() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store.set_phase(Phase::Technical).await.unwrap_err();
        assert!(matches!(err, InterviewError::NoActiveSession));
        assert!(store.end().await.is_none());
        assert_eq!(store.time_remaining().await, 0);
    }

    #[tokio::test]
    async fn test_update_scores_merges() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.create("Ada", "Engineer").await.unwrap();

        let mut scores = IndexMap::new();
        scores.insert("overall".to_string(), 6.5);
        scores.insert("cultural_fit".to_string(), 7.0);
        store.update_scores(scores).await.unwrap();

        let session = store.snapshot().await.unwrap();
        assert_eq!(session.scores["overall"], 6.5);
        assert_eq!(session.scores["cultural_fit"], 7.0);
        assert_eq!(session.scores["technical_knowledge"], 0.0);
    }

    #[tokio::test]
    async fn test_idle_session_times_out() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.create("Ada", "Engineer").await.unwrap();

        {
            let mut guard = store.current.write().await;
            let session = guard.as_mut().unwrap();
            session.last_activity = Utc::now() - chrono::Duration::seconds(901);
        }

        assert!(store.is_timed_out().await);
        assert_eq!(store.time_remaining().await, 0);
    }

    #[tokio::test]
    async fn test_end_writes_transcript_and_report() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let id = store.create("Ada", "Engineer").await.unwrap();
        store
            .record_question("Welcome", QuestionKind::Introduction)
            .await
            .unwrap();
        store.record_response("Hello", None).await.unwrap();

        let report = store.end().await.unwrap();
        assert_eq!(report.total_questions, 1);
        assert_eq!(report.total_responses, 1);
        assert!(!store.is_active().await);
        assert!(store.transcript_path(&id).is_file());
        assert!(store.evaluation_path(&id).is_file());

        let raw = std::fs::read_to_string(store.transcript_path(&id)).unwrap();
        let transcript: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(transcript["conversation"][0]["type"], "question");
        assert_eq!(transcript["conversation"][1]["type"], "response");
    }

    #[tokio::test]
    async fn test_publish_lifecycle_reaches_context() {
        use crate::coordinator::shared_context::{ContextBus, Owner};

        let dir = TempDir::new().unwrap();
        let (context, _bus) = ContextBus::spawn();
        let store = store_in(&dir).with_context(context.writer(Owner::Session));

        let id = store.create("Ada", "Engineer").await.unwrap();
        store.set_phase(Phase::Technical).await.unwrap();
        store.publish_lifecycle().await.unwrap();

        let snapshot = context.snapshot().await.unwrap();
        assert_eq!(snapshot.lifecycle.session_id.as_deref(), Some(id.as_str()));
        assert_eq!(snapshot.lifecycle.phase, Some(Phase::Technical));
        assert!(snapshot.lifecycle.is_active);

        store.end().await.unwrap();
        store.publish_lifecycle().await.unwrap();
        assert!(!context.snapshot().await.unwrap().lifecycle.is_active);
    }

    #[tokio::test]
    async fn test_store_bound_to_wrong_owner_is_rejected() {
        use crate::coordinator::shared_context::{ContextBus, KeyGroup, Owner};

        let dir = TempDir::new().unwrap();
        let (context, _bus) = ContextBus::spawn();
        let store = store_in(&dir).with_context(context.writer(Owner::Scorer));
        store.create("Ada", "Engineer").await.unwrap();

        let err = store.publish_lifecycle().await.unwrap_err();
        assert!(matches!(
            err,
            InterviewError::UnauthorizedWrite {
                group: KeyGroup::Lifecycle,
                ..
            }
        ));
        assert_eq!(context.snapshot().await.unwrap().revision, 0);
    }

    #[tokio::test]
    async fn test_publish_without_context_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.publish_lifecycle().await.unwrap();
    }
}
