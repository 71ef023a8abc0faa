use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::WorkflowError;
use crate::workflows::gate::ApprovalGate;
use crate::workflows::lifecycle::{WorkflowLifecycle, WorkflowState};
use crate::workflows::status::StatusRegister;

/// Terminal value of a run
pub type WorkflowOutcome = Result<String, WorkflowError>;

/// One run of the approval workflow and everything it owns
#[derive(Debug)]
pub struct WorkflowInstance {
    id: String,
    input: String,
    started_at: DateTime<Utc>,
    status: StatusRegister,
    gate: ApprovalGate,
    state: Arc<watch::Sender<WorkflowState>>,
    outcome: watch::Sender<Option<WorkflowOutcome>>,
}

impl WorkflowInstance {
    pub fn new(id: impl Into<String>, input: impl Into<String>) -> Self {
        let (state, _) = watch::channel(WorkflowState::Initializing);
        let (outcome, _) = watch::channel(None);
        Self {
            id: id.into(),
            input: input.into(),
            started_at: Utc::now(),
            status: StatusRegister::new(),
            gate: ApprovalGate::new(),
            state: Arc::new(state),
            outcome,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> &StatusRegister {
        &self.status
    }

    pub fn gate(&self) -> &ApprovalGate {
        &self.gate
    }

    pub fn state(&self) -> WorkflowState {
        *self.state.borrow()
    }

    /// Transition table bound to this instance's register and state
    pub fn lifecycle(&self) -> WorkflowLifecycle {
        WorkflowLifecycle::new(self.id.clone(), self.status.clone(), self.state.clone())
    }

    /// Record the terminal outcome. Only the first call has any effect.
    pub fn finish(&self, outcome: WorkflowOutcome) -> bool {
        self.outcome.send_if_modified(|slot| {
            if slot.is_some() {
                false
            } else {
                *slot = Some(outcome);
                true
            }
        })
    }

    pub fn outcome(&self) -> Option<WorkflowOutcome> {
        self.outcome.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Wait for the terminal outcome
    pub async fn wait_for_outcome(&self) -> WorkflowOutcome {
        let mut rx = self.outcome.subscribe();
        let settled = rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|outcome| outcome.clone());

        settled.unwrap_or_else(|| {
            Err(WorkflowError::Interrupted {
                instance_id: self.id.clone(),
            })
        })
    }
}
