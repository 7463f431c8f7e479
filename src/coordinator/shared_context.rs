//! Shared interview context
//!
//! The context is owned by one actor task. Components read immutable `Arc`
//! snapshots through a [`ContextHandle`] and publish through a
//! [`ContextWriter`] bound to their [`Owner`] when they are built. Each key
//! group has exactly one writer.

use crate::documents::models::{JobPosting, ResumeProfile, SkillMatch};
use crate::error::{InterviewError, Result};
use crate::planner::models::{Depth, TimePressure, TopicCategory, TransitionAdvice};
use crate::scoring::models::PerformanceInsights;
use crate::session::models::Phase;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const BUS_BUFFER: usize = 32;

/// Component issuing a context write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Coordinator,
    Scorer,
    Session,
    Documents,
}

/// Group of context keys with a single permitted writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyGroup {
    Documents,
    Guidance,
    Performance,
    Lifecycle,
}

impl KeyGroup {
    pub fn owner(self) -> Owner {
        match self {
            KeyGroup::Documents => Owner::Documents,
            KeyGroup::Guidance => Owner::Coordinator,
            KeyGroup::Performance => Owner::Scorer,
            KeyGroup::Lifecycle => Owner::Session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFacts {
    pub job_posting: JobPosting,
    pub resume: ResumeProfile,
    pub skill_match: SkillMatch,
    pub focus_areas: Vec<String>,
}

/// Topic steering for the next question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidanceState {
    pub current_topic: Option<String>,
    pub topic_category: Option<TopicCategory>,
    pub suggested_depth: Depth,
    pub transition: Option<TransitionAdvice>,
    pub time_status: Option<TimePressure>,
    pub completed_topics: Vec<String>,
    pub pending_topics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceState {
    pub insights: PerformanceInsights,
    pub latest_feedback: Option<String>,
    pub evaluation_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleState {
    pub session_id: Option<String>,
    pub phase: Option<Phase>,
    pub is_active: bool,
    pub time_remaining_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedContext {
    pub documents: Option<DocumentFacts>,
    pub guidance: GuidanceState,
    pub performance: PerformanceState,
    pub lifecycle: LifecycleState,
    /// Number of writes applied so far
    pub revision: u64,
}

/// Replacement of one key group
#[derive(Debug, Clone)]
pub enum ContextWrite {
    Documents(Box<DocumentFacts>),
    Guidance(GuidanceState),
    Performance(PerformanceState),
    Lifecycle(LifecycleState),
}

impl ContextWrite {
    pub fn group(&self) -> KeyGroup {
        match self {
            ContextWrite::Documents(_) => KeyGroup::Documents,
            ContextWrite::Guidance(_) => KeyGroup::Guidance,
            ContextWrite::Performance(_) => KeyGroup::Performance,
            ContextWrite::Lifecycle(_) => KeyGroup::Lifecycle,
        }
    }

    fn apply(self, context: &mut SharedContext) {
        match self {
            ContextWrite::Documents(facts) => context.documents = Some(*facts),
            ContextWrite::Guidance(guidance) => context.guidance = guidance,
            ContextWrite::Performance(performance) => context.performance = performance,
            ContextWrite::Lifecycle(lifecycle) => context.lifecycle = lifecycle,
        }
    }
}

enum ContextRequest {
    Write {
        owner: Owner,
        write: ContextWrite,
        reply: oneshot::Sender<Result<u64>>,
    },
    Snapshot {
        reply: oneshot::Sender<Arc<SharedContext>>,
    },
}

/// Actor owning the shared context
pub struct ContextBus {
    rx: mpsc::Receiver<ContextRequest>,
    current: Arc<SharedContext>,
}

impl ContextBus {
    /// Spawn the actor. It stops once every handle is dropped.
    pub fn spawn() -> (ContextHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(BUS_BUFFER);
        let bus = ContextBus {
            rx,
            current: Arc::new(SharedContext::default()),
        };
        let handle = tokio::spawn(bus.run());
        (ContextHandle { tx }, handle)
    }

    async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            match request {
                ContextRequest::Write { owner, write, reply } => {
                    let result = self.apply(owner, write);
                    let _ = reply.send(result);
                }
                ContextRequest::Snapshot { reply } => {
                    let _ = reply.send(self.current.clone());
                }
            }
        }
        debug!("Shared context bus stopped");
    }

    fn apply(&mut self, owner: Owner, write: ContextWrite) -> Result<u64> {
        let group = write.group();
        if group.owner() != owner {
            warn!("Rejected shared context write of {:?} by {:?}", group, owner);
            return Err(InterviewError::UnauthorizedWrite { owner, group });
        }

        // readers holding the previous snapshot keep it unchanged
        let context = Arc::make_mut(&mut self.current);
        write.apply(context);
        context.revision += 1;
        Ok(context.revision)
    }
}

/// Cloneable read client of the context bus
#[derive(Debug, Clone)]
pub struct ContextHandle {
    tx: mpsc::Sender<ContextRequest>,
}

impl ContextHandle {
    /// Writer that publishes on behalf of `owner`
    pub fn writer(&self, owner: Owner) -> ContextWriter {
        ContextWriter {
            owner,
            tx: self.tx.clone(),
        }
    }

    pub async fn snapshot(&self) -> Result<Arc<SharedContext>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ContextRequest::Snapshot { reply })
            .await
            .map_err(|_| InterviewError::ContextClosed)?;
        rx.await.map_err(|_| InterviewError::ContextClosed)
    }
}

/// Write access to the context under a fixed owner
#[derive(Debug, Clone)]
pub struct ContextWriter {
    owner: Owner,
    tx: mpsc::Sender<ContextRequest>,
}

impl ContextWriter {
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Replace one key group; returns the new revision
    pub async fn write(&self, write: ContextWrite) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ContextRequest::Write {
                owner: self.owner,
                write,
                reply,
            })
            .await
            .map_err(|_| InterviewError::ContextClosed)?;
        rx.await.map_err(|_| InterviewError::ContextClosed)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_owner_writes_are_applied() {
        let (handle, _task) = ContextBus::spawn();

        let guidance = GuidanceState {
            current_topic: Some("Rust".to_string()),
            suggested_depth: Depth::Medium,
            ..GuidanceState::default()
        };
        let revision = handle
            .writer(Owner::Coordinator)
            .write(ContextWrite::Guidance(guidance))
            .await
            .unwrap();
        assert_eq!(revision, 1);

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.guidance.current_topic.as_deref(), Some("Rust"));
    }

    #[tokio::test]
    async fn test_foreign_write_is_rejected() {
        let (handle, _task) = ContextBus::spawn();

        let scorer = handle.writer(Owner::Scorer);
        assert_eq!(scorer.owner(), Owner::Scorer);
        let err = scorer
            .write(ContextWrite::Guidance(GuidanceState::default()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InterviewError::UnauthorizedWrite {
                owner: Owner::Scorer,
                group: KeyGroup::Guidance
            }
        ));
        assert_eq!(handle.snapshot().await.unwrap().revision, 0);
    }

    #[tokio::test]
    async fn test_snapshots_are_isolated_from_later_writes() {
        let (handle, _task) = ContextBus::spawn();
        let before = handle.snapshot().await.unwrap();

        let lifecycle = LifecycleState {
            session_id: Some("interview_1".to_string()),
            phase: Some(Phase::Technical),
            is_active: true,
            time_remaining_secs: 900,
        };
        handle
            .writer(Owner::Session)
            .write(ContextWrite::Lifecycle(lifecycle))
            .await
            .unwrap();

        let after = handle.snapshot().await.unwrap();
        assert!(before.lifecycle.session_id.is_none());
        assert_eq!(after.lifecycle.phase, Some(Phase::Technical));
    }

    #[tokio::test]
    async fn test_closed_bus_reports_error() {
        let (handle, task) = ContextBus::spawn();
        task.abort();
        let _ = task.await;

        let err = handle.snapshot().await.unwrap_err();
        assert!(matches!(err, InterviewError::ContextClosed));
    }
}
