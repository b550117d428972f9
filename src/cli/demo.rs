use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use autofill_core_types::{AutomationRequest, TaskId, TaskStatus};
use autofill_scheduler::TaskManager;
use clap::Args;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::simulate::SimulatedRunner;
use crate::supervisor::{supervise, LineSink, SinkClosed, SupervisorLimits, SupervisorOutcome};

#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    /// Request file (.yaml, .yml or .json)
    #[arg(long, value_name = "FILE")]
    pub request: PathBuf,

    /// Task id to use instead of a generated one
    #[arg(long)]
    pub task_id: Option<String>,

    /// Delay added to every simulated driver call, in milliseconds
    #[arg(long, default_value_t = 50)]
    pub latency_ms: u64,

    /// Keep the configured settle delays instead of skipping them
    #[arg(long)]
    pub real_pacing: bool,
}

/// Writes each progress line to stdout.
struct StdoutSink {
    out: Mutex<Stdout>,
}

#[async_trait]
impl LineSink for StdoutSink {
    async fn send_line(&self, line: String) -> Result<(), SinkClosed> {
        let mut out = self.out.lock().await;
        out.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|_| SinkClosed)?;
        out.flush().await.map_err(|_| SinkClosed)
    }

    async fn keepalive(&self) -> Result<(), SinkClosed> {
        info!("still running");
        Ok(())
    }
}

/// Runs one request against the simulated portal and streams its progress.
pub async fn cmd_demo(args: DemoArgs, config: AppConfig) -> Result<()> {
    let request = read_request(&args.request).await?;
    let pacing = if args.real_pacing {
        config.pacing.clone()
    } else {
        action_flow::PacingConfig::immediate()
    };
    let runner = SimulatedRunner::new(config.portal.clone(), pacing, config.policy.clone())
        .with_latency(Duration::from_millis(args.latency_ms));
    let manager = TaskManager::new(Arc::new(runner), config.tasks.manager.clone());

    let id = args.task_id.map(TaskId::from).unwrap_or_default();
    manager.start_task(id.clone(), request)?;
    info!(task_id = %id, "demo task started");

    let disconnect = CancellationToken::new();
    let on_interrupt = disconnect.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling task");
            on_interrupt.cancel();
        }
    });

    let sink = StdoutSink {
        out: Mutex::new(tokio::io::stdout()),
    };
    let outcome = supervise(
        &manager,
        &id,
        &sink,
        disconnect,
        SupervisorLimits::from(&config.supervisor),
    )
    .await?;
    interrupt.abort();

    match outcome {
        SupervisorOutcome::Completed(snapshot) => match snapshot.status {
            TaskStatus::Completed => {
                info!(task_id = %id, "demo task completed");
                Ok(())
            }
            status => bail!(
                "task {id} ended as {status}: {}",
                snapshot.error.as_deref().unwrap_or("no error recorded")
            ),
        },
        SupervisorOutcome::Disconnected => {
            let snapshot = manager.wait_for_completion(&id).await?;
            bail!("task {id} interrupted ({})", snapshot.status)
        }
        SupervisorOutcome::TimedOut => bail!("task {id} exceeded its deadline"),
    }
}

async fn read_request(path: &Path) -> Result<AutomationRequest> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    parse_request(path, &raw)
}

fn parse_request(path: &Path, raw: &str) -> Result<AutomationRequest> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let request = if is_json {
        serde_json::from_str(raw).context("invalid JSON request")?
    } else {
        serde_yaml::from_str(raw).context("invalid YAML request")?
    };
    Ok(request)
}
