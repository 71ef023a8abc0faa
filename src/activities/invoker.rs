// Retrying invoker for a single remote task, bounded by a start-to-close budget

use std::sync::Arc;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::activities::{ActivityOptions, RemoteTask};
use crate::error::{TaskError, WorkflowError};
use crate::observability::workflow_metrics;

pub struct TaskInvoker {
    task: Arc<dyn RemoteTask>,
    options: ActivityOptions,
}

impl std::fmt::Debug for TaskInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskInvoker")
            .field("task", &"Arc<dyn RemoteTask>")
            .field("options", &self.options)
            .finish()
    }
}

impl TaskInvoker {
    pub fn new(task: Arc<dyn RemoteTask>, options: ActivityOptions) -> Self {
        Self { task, options }
    }

    /// Run the task until it succeeds, fails permanently, or the budget runs out.
    ///
    /// The budget covers every attempt and every backoff delay. An attempt still
    /// running when the budget ends is dropped.
    pub async fn invoke(&self, input: &str) -> Result<String, WorkflowError> {
        let budget = self.options.start_to_close_timeout();
        let policy = self.options.retry_policy();
        let deadline = Instant::now() + budget;
        let mut backoff = policy.backoff();
        let mut attempts = 0u32;
        let mut last_error: Option<TaskError> = None;

        loop {
            attempts += 1;
            workflow_metrics().record_task_attempt();
            debug!(attempt = attempts, "Invoking remote task");

            match timeout_at(deadline, self.task.execute(input.to_string())).await {
                Ok(Ok(output)) => {
                    info!(attempt = attempts, "Remote task succeeded");
                    return Ok(output);
                }
                Ok(Err(task_error)) if !task_error.is_retryable() => {
                    error!(attempt = attempts, error = %task_error, "Remote task failed (non-retryable)");
                    return Err(WorkflowError::RemoteTask(task_error));
                }
                Ok(Err(task_error)) => {
                    warn!(attempt = attempts, error = %task_error, "Remote task failed (retryable)");
                    last_error = Some(task_error);
                }
                Err(_) => {
                    warn!(attempt = attempts, budget_ms = budget.as_millis() as u64, "Remote task attempt overran its budget");
                    return Err(WorkflowError::RemoteTaskTimeout {
                        timeout: budget,
                        attempts,
                        cause: last_error,
                    });
                }
            }

            if policy.maximum_attempts().is_some_and(|max| attempts >= max) {
                let cause = last_error.unwrap_or_else(|| TaskError::retryable("attempt budget exhausted"));
                error!(attempts, error = %cause, "Remote task exhausted its attempts");
                return Err(WorkflowError::RemoteTask(cause));
            }

            let delay = backoff.next().unwrap_or(policy.maximum_interval());
            if Instant::now() + delay >= deadline {
                warn!(
                    attempts,
                    next_delay_ms = delay.as_millis() as u64,
                    "Next retry would exceed the start-to-close budget, giving up"
                );
                return Err(WorkflowError::RemoteTaskTimeout {
                    timeout: budget,
                    attempts,
                    cause: last_error,
                });
            }

            workflow_metrics().record_task_retry();
            debug!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
            sleep(delay).await;
        }
    }
}
