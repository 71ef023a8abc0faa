// Approval workflow orchestration: status register, approval gate, lifecycle and host

pub mod approval;
pub mod gate;
pub mod host;
pub mod instance;
pub mod lifecycle;
pub mod status;

pub use approval::{ApprovalWorkflow, WorkflowOptions};
pub use gate::{ApprovalGate, SETTLE_WINDOW};
pub use host::{WorkflowHandle, WorkflowHost, WorkflowQuery, WorkflowSignal, APPROVE_SIGNAL, WORKFLOW_STATUS_QUERY};
pub use instance::{WorkflowInstance, WorkflowOutcome};
pub use lifecycle::{LifecycleEvent, WorkflowLifecycle, WorkflowState};
pub use status::{phase, PhaseSnapshot, StatusRegister};
