// Approval workflow: invoke the remote task, wait for a human, report the result

use statig::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Instrument};

use crate::activities::{ActivityOptions, RemoteTask, TaskInvoker};
use crate::error::{ConfigError, WorkflowError};
use crate::observability::{workflow_metrics, OperationTimer};
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflows::instance::{WorkflowInstance, WorkflowOutcome};
use crate::workflows::lifecycle::LifecycleEvent;

/// Validated, immutable options for the whole workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOptions {
    approval_timeout: Duration,
    activity: ActivityOptions,
}

impl WorkflowOptions {
    pub fn new(approval_timeout: Duration, activity: ActivityOptions) -> Result<Self, ConfigError> {
        if approval_timeout.is_zero() {
            return Err(ConfigError::NonPositiveDuration {
                field: "approval_timeout",
            });
        }
        Ok(Self {
            approval_timeout,
            activity,
        })
    }

    pub fn approval_timeout(&self) -> Duration {
        self.approval_timeout
    }

    pub fn activity(&self) -> &ActivityOptions {
        &self.activity
    }
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            approval_timeout: Duration::from_secs(30),
            activity: ActivityOptions::default(),
        }
    }
}

#[derive(Debug)]
pub struct ApprovalWorkflow {
    invoker: TaskInvoker,
    approval_timeout: Duration,
}

impl ApprovalWorkflow {
    pub fn new(task: Arc<dyn RemoteTask>, options: WorkflowOptions) -> Self {
        Self {
            invoker: TaskInvoker::new(task, options.activity.clone()),
            approval_timeout: options.approval_timeout,
        }
    }

    pub fn approval_timeout(&self) -> Duration {
        self.approval_timeout
    }

    /// Drive one instance to a terminal state and return its outcome.
    ///
    /// The caller is responsible for recording the outcome on the instance.
    pub async fn run(&self, instance: &WorkflowInstance) -> WorkflowOutcome {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span("approval", instance.id(), &correlation_id);

        async {
            let timer = OperationTimer::new("approval_workflow");
            let outcome = self.execute(instance).await;
            timer.finish();
            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, instance: &WorkflowInstance) -> WorkflowOutcome {
        let mut lifecycle = instance.lifecycle().state_machine();
        lifecycle.handle(&LifecycleEvent::Start);

        let output = match self.invoker.invoke(instance.input()).await {
            Ok(output) => {
                lifecycle.handle(&LifecycleEvent::TaskCompleted);
                output
            }
            Err(error) => {
                lifecycle.handle(&LifecycleEvent::TaskFailed);
                return Err(error);
            }
        };

        if instance.gate().await_approval(self.approval_timeout).await {
            lifecycle.handle(&LifecycleEvent::ApprovalReceived);
        } else {
            info!(
                approval_timeout_ms = self.approval_timeout.as_millis() as u64,
                "The approval did not arrive on time"
            );
            workflow_metrics().record_approval_timeout();
            lifecycle.handle(&LifecycleEvent::ApprovalExpired);
            return Err(WorkflowError::ApprovalTimeout {
                timeout: self.approval_timeout,
            });
        }

        lifecycle.handle(&LifecycleEvent::BeginCompletion);
        let result = format!("Echo returned: {output}");
        lifecycle.handle(&LifecycleEvent::ResultDelivered);

        Ok(result)
    }
}
