// In-process orchestration host: starts instances and routes signals and queries by name

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use crate::activities::RemoteTask;
use crate::error::{HostError, WorkflowError};
use crate::observability::workflow_metrics;
use crate::workflows::approval::{ApprovalWorkflow, WorkflowOptions};
use crate::workflows::instance::{WorkflowInstance, WorkflowOutcome};
use crate::workflows::lifecycle::WorkflowState;
use crate::workflows::status::PhaseSnapshot;

pub const APPROVE_SIGNAL: &str = "approveSignal";
pub const WORKFLOW_STATUS_QUERY: &str = "workflowStatus";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowSignal {
    Approve,
}

impl WorkflowSignal {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowSignal::Approve => APPROVE_SIGNAL,
        }
    }
}

impl FromStr for WorkflowSignal {
    type Err = HostError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            APPROVE_SIGNAL => Ok(WorkflowSignal::Approve),
            other => Err(HostError::UnknownSignal(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowQuery {
    Status,
}

impl WorkflowQuery {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowQuery::Status => WORKFLOW_STATUS_QUERY,
        }
    }
}

impl FromStr for WorkflowQuery {
    type Err = HostError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            WORKFLOW_STATUS_QUERY => Ok(WorkflowQuery::Status),
            other => Err(HostError::UnknownQuery(other.to_string())),
        }
    }
}

/// Client-side handle to a started instance
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    instance: Arc<WorkflowInstance>,
}

impl WorkflowHandle {
    fn new(instance: Arc<WorkflowInstance>) -> Self {
        Self { instance }
    }

    pub fn id(&self) -> &str {
        self.instance.id()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.instance.started_at()
    }

    /// Deliver a signal. Safe to repeat, before or after completion.
    pub fn signal(&self, signal: WorkflowSignal) {
        match signal {
            WorkflowSignal::Approve => {
                workflow_metrics().record_approval_signal();
                let first = self.instance.gate().signal_approved();
                info!(workflow.id = %self.id(), first, "Approve Signal Received");
            }
        }
    }

    pub fn approve(&self) {
        self.signal(WorkflowSignal::Approve);
    }

    pub fn query(&self, query: WorkflowQuery) -> String {
        match query {
            WorkflowQuery::Status => self.instance.status().phase(),
        }
    }

    pub fn status(&self) -> String {
        self.query(WorkflowQuery::Status)
    }

    pub fn status_snapshot(&self) -> PhaseSnapshot {
        self.instance.status().snapshot()
    }

    /// Receiver notified on every phase change
    pub fn subscribe_status(&self) -> watch::Receiver<PhaseSnapshot> {
        self.instance.status().subscribe()
    }

    pub fn state(&self) -> WorkflowState {
        self.instance.state()
    }

    pub fn is_finished(&self) -> bool {
        self.instance.is_finished()
    }

    /// Await the terminal outcome; any number of callers may wait
    pub async fn result(&self) -> WorkflowOutcome {
        self.instance.wait_for_outcome().await
    }
}

/// Starts approval workflows on the current tokio runtime and keeps them addressable by id
pub struct WorkflowHost {
    workflow: Arc<ApprovalWorkflow>,
    instances: RwLock<HashMap<String, Arc<WorkflowInstance>>>,
}

impl std::fmt::Debug for WorkflowHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowHost")
            .field("workflow", &self.workflow)
            .field("instances", &"RwLock<HashMap<String, Arc<WorkflowInstance>>>")
            .finish()
    }
}

impl WorkflowHost {
    pub fn new(task: Arc<dyn RemoteTask>, options: WorkflowOptions) -> Self {
        Self {
            workflow: Arc::new(ApprovalWorkflow::new(task, options)),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new instance under an externally assigned id
    pub async fn start(&self, id: impl Into<String>, input: impl Into<String>) -> Result<WorkflowHandle, HostError> {
        let id = id.into();
        let instance = {
            let mut instances = self.instances.write().await;
            if instances.contains_key(&id) {
                warn!(workflow.id = %id, "Refusing to start duplicate workflow");
                return Err(HostError::AlreadyStarted(id));
            }
            let instance = Arc::new(WorkflowInstance::new(id.clone(), input));
            instances.insert(id.clone(), instance.clone());
            instance
        };

        workflow_metrics().record_workflow_started();
        info!(workflow.id = %id, "Started workflow");

        let workflow = self.workflow.clone();
        let running = {
            let instance = instance.clone();
            tokio::spawn(async move { workflow.run(&instance).await })
        };

        let supervised = instance.clone();
        tokio::spawn(async move {
            let outcome = match running.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    error!(workflow.id = %supervised.id(), error = %join_error, "Workflow task aborted");
                    Err(WorkflowError::Interrupted {
                        instance_id: supervised.id().to_string(),
                    })
                }
            };
            match &outcome {
                Ok(_) => workflow_metrics().record_workflow_completed(),
                Err(failure) => {
                    workflow_metrics().record_workflow_failed();
                    info!(workflow.id = %supervised.id(), kind = %failure.kind(), error = %failure, "Workflow failed");
                }
            }
            supervised.finish(outcome);
        });

        Ok(WorkflowHandle::new(instance))
    }

    pub async fn handle(&self, id: &str) -> Result<WorkflowHandle, HostError> {
        self.instances
            .read()
            .await
            .get(id)
            .cloned()
            .map(WorkflowHandle::new)
            .ok_or_else(|| HostError::NotFound(id.to_string()))
    }

    /// Dispatch a signal by name
    pub async fn signal(&self, id: &str, name: &str) -> Result<(), HostError> {
        let signal = WorkflowSignal::from_str(name)?;
        self.handle(id).await?.signal(signal);
        Ok(())
    }

    /// Dispatch a query by name
    pub async fn query(&self, id: &str, name: &str) -> Result<String, HostError> {
        let query = WorkflowQuery::from_str(name)?;
        Ok(self.handle(id).await?.query(query))
    }

    /// Forget a finished instance and free its id. Running instances stay put.
    pub async fn remove(&self, id: &str) -> Result<WorkflowHandle, HostError> {
        let mut instances = self.instances.write().await;
        match instances.get(id) {
            None => Err(HostError::NotFound(id.to_string())),
            Some(instance) if !instance.is_finished() => Err(HostError::StillRunning(id.to_string())),
            Some(_) => {
                let removed = instances.remove(id).ok_or_else(|| HostError::NotFound(id.to_string()))?;
                debug!(workflow.id = %id, "Removed finished workflow");
                Ok(WorkflowHandle::new(removed))
            }
        }
    }

    /// Forget every finished instance, returning how many were dropped
    pub async fn prune_finished(&self) -> usize {
        let mut instances = self.instances.write().await;
        let before = instances.len();
        instances.retain(|_, instance| !instance.is_finished());
        let pruned = before - instances.len();
        if pruned > 0 {
            info!(pruned, retained = instances.len(), "Pruned finished workflows");
        }
        pruned
    }

    pub async fn instance_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.instances.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
