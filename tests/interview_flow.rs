//! End-to-end interview tests
//!
//! Drive a full interview from document files to the final evaluation report
//! with a scripted text generator and a temporary data directory.

use async_trait::async_trait;
use interview_coordinator::config::{Config, PlannerConfig, SessionConfig};
use interview_coordinator::coordinator::{Command, CommandOutcome, EventType, InterviewCoordinator};
use interview_coordinator::planner::NextTopic;
use interview_coordinator::session::{Phase, QuestionKind, TranscriptEntry};
use interview_coordinator::strategist::{GenerationError, QuestionSource, TextGenerator};
use interview_coordinator::InterviewError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const POSTING: &str = "\
Senior Backend Engineer
Company: Acme Widgets

Requirements
- Python required
- Distributed system design
- 5+ years of backend experience
- Docker and Kubernetes

Responsibilities
- Build and operate payment services
";

const RESUME: &str = "\
Ada Lovelace
Senior Software Engineer
8 years of experience building backend platforms
Skills: Python, SQL, Docker
- Payments Corp: Staff Engineer
Education: University of London
";

const STRONG_ANSWER: &str = "For example, in my last project I designed a Python service \
that processed payment events through a queue. I measured latency, found the database \
was the bottleneck, and introduced caching and batching. First I profiled the workload, \
then I compared two approaches, and finally we rolled the change out gradually. The result \
was a forty percent reduction in p99 latency and a simpler architecture for the team.";

/// Numbers each question so the test can tell generated text apart
struct ScriptedGenerator {
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let shape = prompt
            .lines()
            .find_map(|line| line.trim().strip_prefix("Question shape: "))
            .unwrap_or("Tell me about your work.");
        Ok(format!("Q{}: {}", n, shape.trim()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct Fixture {
    dir: TempDir,
    generator: Arc<ScriptedGenerator>,
    coordinator: InterviewCoordinator,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("job.txt"), POSTING).unwrap();
    std::fs::write(dir.path().join("resume.txt"), RESUME).unwrap();

    let mut config = Config {
        session: SessionConfig {
            data_dir: dir.path().join("data"),
            ..SessionConfig::default()
        },
        planner: PlannerConfig {
            duration_minutes: 45,
            ..PlannerConfig::default()
        },
        ..Config::default()
    };
    config.generation.streaming = false;

    let generator = Arc::new(ScriptedGenerator::new());
    let coordinator = InterviewCoordinator::new(config, generator.clone());
    Fixture {
        dir,
        generator,
        coordinator,
    }
}

#[tokio::test]
async fn test_full_interview_reaches_complete() {
    let Fixture {
        dir,
        generator,
        mut coordinator,
    } = fixture().await;

    let opening = coordinator
        .start(dir.path().join("job.txt"), dir.path().join("resume.txt"))
        .await
        .unwrap();
    assert_eq!(opening.kind, QuestionKind::Introduction);
    assert_eq!(opening.source, QuestionSource::Template);

    let mut phases = vec![Phase::Introduction];
    let mut report = None;
    for _ in 0..80 {
        let outcome = coordinator.take_turn(STRONG_ANSWER).await.unwrap();
        if phases.last() != Some(&outcome.phase) {
            phases.push(outcome.phase);
        }
        if outcome.is_finished() {
            report = outcome.report;
            break;
        }
    }

    let report = report.expect("interview did not finish");
    assert_eq!(phases.first(), Some(&Phase::Introduction));
    assert_eq!(phases.last(), Some(&Phase::Complete));
    assert!(phases.windows(2).all(|w| w[0] < w[1]));
    assert!(generator.calls.load(Ordering::SeqCst) > 0);

    assert_eq!(report.candidate_name, "Ada Lovelace");
    assert_eq!(report.phases_completed, Phase::Complete);
    assert!(report.total_questions >= report.total_responses);
    let coverage = report.topic_coverage.as_ref().unwrap();
    assert_eq!(coverage.covered_count, coverage.total_count);
    for key in ["technical_knowledge", "communication_skills", "problem_solving", "overall"] {
        assert!(report.scores.contains_key(key), "missing score {}", key);
    }

    let store = coordinator.store();
    assert!(!store.is_active().await);
    assert!(store.session_path(&report.session_id).is_file());
    assert!(store.evaluation_path(&report.session_id).is_file());

    let raw = std::fs::read_to_string(store.transcript_path(&report.session_id)).unwrap();
    let transcript: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entries: Vec<TranscriptEntry> =
        serde_json::from_value(transcript["conversation"].clone()).unwrap();
    assert!(matches!(entries.first(), Some(TranscriptEntry::Question { .. })));

    let events = coordinator.event_log();
    let count = |t: EventType| events.iter().filter(|e| e.event_type == t).count();
    assert_eq!(count(EventType::InterviewStarted), 1);
    assert_eq!(count(EventType::InterviewEnded), 1);
    assert_eq!(count(EventType::PhaseChanged), 4);
    assert!(count(EventType::TopicChanged) >= coverage.total_count);
}

#[tokio::test]
async fn test_missing_document_aborts_start() {
    let Fixture {
        dir,
        mut coordinator,
        ..
    } = fixture().await;

    let err = coordinator
        .start(dir.path().join("missing.txt"), dir.path().join("resume.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::Parse(_)));
    assert!(coordinator.store().session_id().await.is_none());
}

#[tokio::test]
async fn test_operator_commands_mid_interview() {
    let Fixture {
        dir,
        mut coordinator,
        ..
    } = fixture().await;
    coordinator
        .start(dir.path().join("job.txt"), dir.path().join("resume.txt"))
        .await
        .unwrap();

    let first = coordinator
        .dispatch(Command::parse(STRONG_ANSWER))
        .await
        .unwrap();
    let CommandOutcome::Turn(turn) = first else {
        panic!("expected a turn");
    };
    assert_eq!(turn.phase, Phase::Technical);
    assert_eq!(
        turn.question.as_ref().and_then(|q| q.topic.as_deref()),
        Some("Python required")
    );

    let skipped = coordinator
        .dispatch(Command::parse("/next incomplete"))
        .await
        .unwrap();
    let CommandOutcome::Transitioned { next, question } = skipped else {
        panic!("expected a transition");
    };
    // an incomplete topic stays current
    assert_eq!(next, NextTopic::Topic("Python required".to_string()));
    assert!(question.is_some());

    let CommandOutcome::Coverage(coverage) =
        coordinator.dispatch(Command::Coverage).await.unwrap()
    else {
        panic!("expected coverage");
    };
    assert_eq!(coverage.covered_count, 0);
    assert_eq!(coverage.uncovered_high, vec!["Python required".to_string()]);

    let context = coordinator.context().snapshot().await.unwrap();
    assert_eq!(context.lifecycle.phase, Some(Phase::Technical));
    assert!(context.performance.evaluation_count >= 1);

    let CommandOutcome::Ended(report) = coordinator.dispatch(Command::End).await.unwrap() else {
        panic!("expected the interview to end");
    };
    assert!(report.is_some());
    assert!(matches!(
        coordinator.dispatch(Command::Status).await,
        Ok(CommandOutcome::Status(summary)) if !summary.is_active
    ));
}
