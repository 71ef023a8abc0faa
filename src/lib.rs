// Approval Workflow Library - approval-gated remote task orchestration
// This exposes the core components for testing and integration

pub mod activities;
pub mod config;
pub mod error;
pub mod observability;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use activities::{ActivityOptions, EchoTask, RemoteTask, RetryPolicy, TaskInvoker};
pub use crate::config::{config, init_config, ApprovalWorkflowConfig};
pub use error::{ConfigError, FailureKind, HostError, TaskError, WorkflowError};
pub use observability::{workflow_metrics, OperationTimer, WorkflowMetrics};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflows::{
    phase, ApprovalGate, SETTLE_WINDOW, ApprovalWorkflow, StatusRegister, WorkflowHandle, WorkflowHost, WorkflowOptions,
    WorkflowOutcome, WorkflowQuery, WorkflowSignal, WorkflowState,
};
