use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::activities::{ActivityOptions, RetryPolicy};
use crate::error::ConfigError;
use crate::workflows::WorkflowOptions;

/// Main configuration structure for the approval workflow
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApprovalWorkflowConfig {
    /// Workflow-level settings
    pub workflow: WorkflowConfig,
    /// Remote task invocation settings
    pub activity: ActivityConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// How long to wait for the approval signal
    pub approval_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActivityConfig {
    /// Budget for the whole invocation, retries included
    pub start_to_close_timeout_ms: u64,
    /// Retry policy settings
    pub retry: RetryConfig,
    /// Simulated latency of the bundled echo task
    pub echo_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    pub initial_interval_ms: u64,
    pub backoff_coefficient: f64,
    pub maximum_interval_ms: u64,
    /// Zero means unlimited
    pub maximum_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for ApprovalWorkflowConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowConfig {
                approval_timeout_ms: 30_000,
            },
            activity: ActivityConfig {
                start_to_close_timeout_ms: 5_000,
                retry: RetryConfig {
                    initial_interval_ms: 1_000,
                    backoff_coefficient: 2.0,
                    maximum_interval_ms: 30_000,
                    maximum_attempts: 0,
                },
                echo_delay_ms: 1_000,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
        }
    }
}

impl ApprovalWorkflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (approval-workflow.toml, .approval-workflow-rc)
    /// 3. Environment variables (prefixed with APPROVAL_WORKFLOW_, nested keys split on `__`)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("approval-workflow.toml").exists() {
            builder = builder.add_source(File::with_name("approval-workflow"));
        }

        if Path::new(".approval-workflow-rc").exists() {
            builder = builder.add_source(File::new(".approval-workflow-rc", FileFormat::Toml));
        }

        builder = builder.add_source(Self::environment());

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load defaults overlaid with one explicit file and the environment
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path).required(true))
            .add_source(Self::environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse TOML text layered over the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn environment() -> Environment {
        Environment::with_prefix("APPROVAL_WORKFLOW")
            .separator("__")
            .try_parsing(true)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// Validate and convert into the immutable options the workflow runs with
    pub fn workflow_options(&self) -> Result<WorkflowOptions, ConfigError> {
        let retry = &self.activity.retry;
        let policy = RetryPolicy::new(
            Duration::from_millis(retry.initial_interval_ms),
            retry.backoff_coefficient,
            Duration::from_millis(retry.maximum_interval_ms),
        )?
        .with_maximum_attempts(retry.maximum_attempts);

        let activity = ActivityOptions::new(
            Duration::from_millis(self.activity.start_to_close_timeout_ms),
            policy,
        )?;

        WorkflowOptions::new(Duration::from_millis(self.workflow.approval_timeout_ms), activity)
    }

    pub fn echo_delay(&self) -> Duration {
        Duration::from_millis(self.activity.echo_delay_ms)
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ApprovalWorkflowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = ApprovalWorkflowConfig::load_env_file();
        ApprovalWorkflowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ApprovalWorkflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let config = config()?;
    config.workflow_options()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let options = ApprovalWorkflowConfig::default().workflow_options().unwrap();

        assert_eq!(options.approval_timeout(), Duration::from_secs(30));
        assert_eq!(options.activity().start_to_close_timeout(), Duration::from_secs(5));
        let policy = options.activity().retry_policy();
        assert_eq!(policy.initial_interval(), Duration::from_secs(1));
        assert_eq!(policy.backoff_coefficient(), 2.0);
        assert_eq!(policy.maximum_interval(), Duration::from_secs(30));
        assert_eq!(policy.maximum_attempts(), None);
        assert_eq!(options, WorkflowOptions::default());
    }

    #[test]
    fn test_toml_overrides_layer_over_defaults() {
        let config = ApprovalWorkflowConfig::from_toml_str(
            r#"
            [workflow]
            approval_timeout_ms = 45000

            [activity.retry]
            backoff_coefficient = 1.5
            maximum_attempts = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.workflow.approval_timeout_ms, 45_000);
        assert_eq!(config.activity.retry.backoff_coefficient, 1.5);
        assert_eq!(config.activity.retry.maximum_attempts, 4);
        // untouched keys keep their defaults
        assert_eq!(config.activity.start_to_close_timeout_ms, 5_000);
        assert_eq!(config.observability.log_level, "info");

        let options = config.workflow_options().unwrap();
        assert_eq!(options.approval_timeout(), Duration::from_secs(45));
        assert_eq!(options.activity().retry_policy().maximum_attempts(), Some(4));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = ApprovalWorkflowConfig::default();
        config.activity.retry.initial_interval_ms = 0;
        assert_eq!(
            config.workflow_options(),
            Err(ConfigError::NonPositiveDuration {
                field: "initial_interval"
            })
        );

        let mut config = ApprovalWorkflowConfig::default();
        config.workflow.approval_timeout_ms = 0;
        assert!(config.workflow_options().is_err());

        let mut config = ApprovalWorkflowConfig::default();
        config.activity.retry.backoff_coefficient = 0.9;
        assert_eq!(
            config.workflow_options(),
            Err(ConfigError::InvalidBackoffCoefficient(0.9))
        );
    }

    #[test]
    fn test_saved_file_loads_back() {
        let path = std::env::temp_dir().join(format!("approval-workflow-{}.toml", uuid::Uuid::new_v4()));
        let mut config = ApprovalWorkflowConfig::default();
        config.workflow.approval_timeout_ms = 12_000;
        config.observability.json_logs = false;

        config.save_to_file(&path).unwrap();
        let loaded = ApprovalWorkflowConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.workflow.approval_timeout_ms, 12_000);
        assert!(!loaded.observability.json_logs);
    }
}
