//! Interview coordination
//!
//! The coordinator drives turns and phases, publishes topic guidance to the
//! shared context bus, and records a workflow event log. The session store,
//! scorer and document analyzer publish their own key groups.

pub mod commands;
#[allow(clippy::module_inception)]
pub mod coordinator;
pub mod events;
pub mod shared_context;

pub use commands::{Command, HELP_TEXT};
pub use coordinator::{focus_areas, CommandOutcome, InterviewCoordinator, TurnOutcome};
pub use events::{EventLog, EventType, WorkflowEvent};
pub use shared_context::{
    ContextBus, ContextHandle, ContextWrite, ContextWriter, DocumentFacts, GuidanceState, KeyGroup,
    LifecycleState, Owner, PerformanceState, SharedContext,
};
