use serde::{Deserialize, Serialize};
use statig::prelude::*;
use std::sync::Arc;
use tokio::sync::watch;

use crate::workflows::status::{phase, StatusRegister};

/// Formal states of one approval workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Initializing,
    Invoking,
    AwaitingApproval,
    Approved,
    Completing,
    Complete,
    TimedOut,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Complete | WorkflowState::TimedOut | WorkflowState::Failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    TaskCompleted,
    TaskFailed,
    ApprovalReceived,
    ApprovalExpired,
    BeginCompletion,
    ResultDelivered,
}

/// Transition table for a run. Applies the phase strings and publishes the
/// formal state as a side effect of each legal transition; anything else is
/// logged and ignored.
pub struct WorkflowLifecycle {
    instance_id: String,
    status: StatusRegister,
    state: Arc<watch::Sender<WorkflowState>>,
}

impl WorkflowLifecycle {
    pub fn new(
        instance_id: impl Into<String>,
        status: StatusRegister,
        state: Arc<watch::Sender<WorkflowState>>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            status,
            state,
        }
    }

    pub fn current(&self) -> WorkflowState {
        *self.state.borrow()
    }

    /// Publish the formal state, then the phase: whoever observes a new
    /// phase already sees the state that produced it.
    fn enter(&self, next: WorkflowState, phase: Option<&str>) {
        let previous = self.state.send_replace(next);
        if let Some(phase) = phase {
            self.status.set_phase(phase);
        }
        tracing::info!(
            workflow.id = %self.instance_id,
            from = ?previous,
            to = ?next,
            "Workflow state transition"
        );
    }

    fn ignore(&self, event: &LifecycleEvent) -> Outcome<State> {
        tracing::warn!(
            workflow.id = %self.instance_id,
            state = ?self.current(),
            event = ?event,
            "Ignoring event not valid in current state"
        );
        Handled
    }
}

#[state_machine(initial = "State::initializing()")]
impl WorkflowLifecycle {
    #[state]
    fn initializing(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Start => {
                self.enter(WorkflowState::Invoking, None);
                Transition(State::invoking())
            }
            _ => self.ignore(event),
        }
    }

    #[state]
    fn invoking(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::TaskCompleted => {
                self.enter(WorkflowState::AwaitingApproval, Some(phase::AWAITING_APPROVAL));
                Transition(State::awaiting_approval())
            }
            LifecycleEvent::TaskFailed => {
                self.enter(WorkflowState::Failed, None);
                Transition(State::failed())
            }
            _ => self.ignore(event),
        }
    }

    #[state]
    fn awaiting_approval(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::ApprovalReceived => {
                self.enter(WorkflowState::Approved, Some(phase::APPROVED));
                Transition(State::approved())
            }
            LifecycleEvent::ApprovalExpired => {
                self.enter(WorkflowState::TimedOut, Some(phase::TIMED_OUT));
                Transition(State::timed_out())
            }
            _ => self.ignore(event),
        }
    }

    #[state]
    fn approved(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::BeginCompletion => {
                self.enter(WorkflowState::Completing, Some(phase::COMPLETE));
                Transition(State::completing())
            }
            _ => self.ignore(event),
        }
    }

    #[state]
    fn completing(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::ResultDelivered => {
                self.enter(WorkflowState::Complete, None);
                Transition(State::complete())
            }
            _ => self.ignore(event),
        }
    }

    #[state]
    fn complete(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        self.ignore(event)
    }

    #[state]
    fn timed_out(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        self.ignore(event)
    }

    #[state]
    fn failed(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        self.ignore(event)
    }
}
