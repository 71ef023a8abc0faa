// Error taxonomy for remote tasks, workflow outcomes, host dispatch and configuration

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a single remote task attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Transient failure, the invoker may try again
    #[error("transient failure: {0}")]
    Retryable(String),
    /// The remote side says retrying will not help
    #[error("{kind}: {message}")]
    NonRetryable { kind: String, message: String },
}

impl TaskError {
    pub fn retryable(message: impl Into<String>) -> Self {
        TaskError::Retryable(message.into())
    }

    pub fn non_retryable(kind: impl Into<String>, message: impl Into<String>) -> Self {
        TaskError::NonRetryable {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Retryable(_))
    }
}

/// Terminal failure of a workflow instance
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("remote task did not complete within {timeout:?} ({attempts} attempt(s))")]
    RemoteTaskTimeout {
        timeout: Duration,
        attempts: u32,
        #[source]
        cause: Option<TaskError>,
    },
    #[error("Approval not received within {timeout:?}")]
    ApprovalTimeout { timeout: Duration },
    #[error("remote task failed: {0}")]
    RemoteTask(#[source] TaskError),
    #[error("workflow {instance_id} stopped before producing an outcome")]
    Interrupted { instance_id: String },
}

/// Coarse classification so callers can tell "work failed" from "nobody approved in time"
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RemoteTaskTimeout,
    ApprovalTimeout,
    RemoteTask,
    Interrupted,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RemoteTaskTimeout => "remote_task_timeout",
            FailureKind::ApprovalTimeout => "approval_timeout",
            FailureKind::RemoteTask => "remote_task",
            FailureKind::Interrupted => "interrupted",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WorkflowError {
    pub fn kind(&self) -> FailureKind {
        match self {
            WorkflowError::RemoteTaskTimeout { .. } => FailureKind::RemoteTaskTimeout,
            WorkflowError::ApprovalTimeout { .. } => FailureKind::ApprovalTimeout,
            WorkflowError::RemoteTask(_) => FailureKind::RemoteTask,
            WorkflowError::Interrupted { .. } => FailureKind::Interrupted,
        }
    }

    /// Both deadline exits, regardless of which step hit them
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            WorkflowError::RemoteTaskTimeout { .. } | WorkflowError::ApprovalTimeout { .. }
        )
    }
}

/// Errors raised at the host boundary when dispatching by id or name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("workflow '{0}' has already been started")]
    AlreadyStarted(String),
    #[error("workflow '{0}' not found")]
    NotFound(String),
    #[error("unknown signal '{0}'")]
    UnknownSignal(String),
    #[error("unknown query '{0}'")]
    UnknownQuery(String),
    #[error("workflow '{0}' is still running")]
    StillRunning(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NonPositiveDuration { field: &'static str },
    #[error("backoff coefficient must be a finite number >= 1.0, got {0}")]
    InvalidBackoffCoefficient(f64),
    #[error("maximum interval {maximum:?} is shorter than initial interval {initial:?}")]
    MaximumBelowInitial { initial: Duration, maximum: Duration },
}
