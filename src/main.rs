use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use approval_workflow::config::ApprovalWorkflowConfig;
use approval_workflow::{
    init_config, init_telemetry, shutdown_telemetry, workflow_metrics, EchoTask, WorkflowHandle, WorkflowHost, WorkflowQuery,
    WorkflowState,
};

#[derive(Parser)]
#[command(name = "approval-workflow")]
#[command(about = "Run a remote task behind a human approval gate")]
#[command(long_about = "Starts an approval workflow that echoes its input through a retried remote task, \
                       waits for an approval signal within a bounded deadline, and reports the result.")]
struct Cli {
    /// Configuration file layered over the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a workflow, query it, approve it and wait for the result
    Run {
        /// Payload handed to the remote task
        input: String,
        /// Workflow id (defaults to workflow-<uuid>)
        #[arg(long)]
        id: Option<String>,
        /// Delay before sending the approval signal
        #[arg(long, default_value = "0", help = "Milliseconds to wait before approving")]
        approve_after_ms: u64,
        /// Never send the approval signal (exercises the timeout path)
        #[arg(long, conflicts_with = "approve_after_ms")]
        no_approve: bool,
        /// Print a JSON summary instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Serialize)]
struct RunSummary {
    id: String,
    started_at: DateTime<Utc>,
    result: Option<String>,
    failure_kind: Option<String>,
    failure: Option<String>,
    phase: String,
    state: WorkflowState,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            ApprovalWorkflowConfig::load_env_file().context("Failed to load .env file")?;
            ApprovalWorkflowConfig::load_from_path(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => {
            init_config()?;
            approval_workflow::config()?.clone()
        }
    };

    match cli.command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Run {
            input,
            id,
            approve_after_ms,
            no_approve,
            json,
        } => {
            init_telemetry(&config.observability)?;
            let approve_after = (!no_approve).then(|| Duration::from_millis(approve_after_ms));
            let outcome = tokio::runtime::Runtime::new()?
                .block_on(async { run_command(&config, input, id, approve_after, json).await });
            workflow_metrics().log_stats();
            shutdown_telemetry();
            outcome
        }
    }
}

async fn run_command(
    config: &ApprovalWorkflowConfig,
    input: String,
    id: Option<String>,
    approve_after: Option<Duration>,
    json: bool,
) -> Result<()> {
    let options = config.workflow_options()?;
    let host = WorkflowHost::new(Arc::new(EchoTask::new(config.echo_delay())), options);

    let id = id.unwrap_or_else(|| format!("workflow-{}", uuid::Uuid::new_v4()));
    let handle = host.start(id, input).await?;
    if !json {
        println!("Started workflow {}", handle.id());
    }

    let query_response = handle.query(WorkflowQuery::Status);
    if !json {
        println!("The response from the query is {query_response}");
    }

    if let Some(delay) = approve_after {
        let approver = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            approver.approve();
        });
    }

    tokio::select! {
        outcome = handle.result() => report(&handle, outcome, json),
        _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!(
            "Interrupted; workflow {} abandoned in phase '{}'",
            handle.id(),
            handle.status()
        )),
    }
}

fn report(handle: &WorkflowHandle, outcome: approval_workflow::WorkflowOutcome, json: bool) -> Result<()> {
    if json {
        let summary = RunSummary {
            id: handle.id().to_string(),
            started_at: handle.started_at(),
            result: outcome.as_ref().ok().cloned(),
            failure_kind: outcome.as_ref().err().map(|e| e.kind().to_string()),
            failure: outcome.as_ref().err().map(|e| e.to_string()),
            phase: handle.status(),
            state: handle.state(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if let Ok(result) = &outcome {
        println!("{result}");
    }

    // a failed workflow always exits non-zero, summary or not
    outcome
        .map(|_| ())
        .map_err(|failure| anyhow::anyhow!("Workflow failed ({}): {}", failure.kind(), failure))
}
