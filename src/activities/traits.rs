// Seam between the workflow and the externally executed unit of work

use crate::error::TaskError;

#[cfg(test)]
use mockall::automock;

/// A single remote operation the workflow can invoke.
///
/// Implementations own transport and execution; the invoker only sees the
/// outcome of each attempt and decides whether to try again.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RemoteTask: Send + Sync {
    /// Run one attempt with the given payload
    async fn execute(&self, input: String) -> Result<String, TaskError>;
}
