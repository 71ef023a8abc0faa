use std::time::Duration;
use tracing::info;

use crate::activities::RemoteTask;
use crate::error::TaskError;

/// Reference remote task: waits briefly and hands its input back
#[derive(Debug, Clone)]
pub struct EchoTask {
    delay: Duration,
}

impl EchoTask {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for EchoTask {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait::async_trait]
impl RemoteTask for EchoTask {
    async fn execute(&self, input: String) -> Result<String, TaskError> {
        info!(input = %input, "echo activity started");
        tokio::time::sleep(self.delay).await;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_echo_returns_input_after_delay() {
        let task = EchoTask::default();
        let started = tokio::time::Instant::now();

        let output = task.execute("Temporal".to_string()).await;

        assert_eq!(output, Ok("Temporal".to_string()));
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }
}
