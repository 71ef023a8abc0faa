use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Process-wide workflow counters
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub workflows_started: AtomicU64,
    pub workflows_completed: AtomicU64,
    pub workflows_failed: AtomicU64,
    pub task_attempts: AtomicU64,
    pub task_retries: AtomicU64,
    pub approval_signals: AtomicU64,
    pub approval_timeouts: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_workflow_started(&self) {
        self.workflows_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_workflow_completed(&self) {
        self.workflows_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_workflow_failed(&self) {
        self.workflows_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_attempt(&self) {
        self.task_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_retry(&self) {
        self.task_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_approval_signal(&self) {
        self.approval_signals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_approval_timeout(&self) {
        self.approval_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> WorkflowStats {
        WorkflowStats {
            workflows_started: self.workflows_started.load(Ordering::Relaxed),
            workflows_completed: self.workflows_completed.load(Ordering::Relaxed),
            workflows_failed: self.workflows_failed.load(Ordering::Relaxed),
            task_attempts: self.task_attempts.load(Ordering::Relaxed),
            task_retries: self.task_retries.load(Ordering::Relaxed),
            approval_signals: self.approval_signals.load(Ordering::Relaxed),
            approval_timeouts: self.approval_timeouts.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            workflows_started = stats.workflows_started,
            workflows_completed = stats.workflows_completed,
            workflows_failed = stats.workflows_failed,
            task_attempts = stats.task_attempts,
            task_retries = stats.task_retries,
            approval_signals = stats.approval_signals,
            approval_timeouts = stats.approval_timeouts,
            "Workflow metrics"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WorkflowStats {
    pub workflows_started: u64,
    pub workflows_completed: u64,
    pub workflows_failed: u64,
    pub task_attempts: u64,
    pub task_retries: u64,
    pub approval_signals: u64,
    pub approval_timeouts: u64,
}

/// Global metrics instance
static WORKFLOW_METRICS: std::sync::LazyLock<WorkflowMetrics> =
    std::sync::LazyLock::new(WorkflowMetrics::new);

pub fn workflow_metrics() -> &'static WorkflowMetrics {
    &WORKFLOW_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
