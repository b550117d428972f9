use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use autofill_scheduler::TaskManager;
use clap::Args;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::server::{router, ServeState};
use crate::simulate::SimulatedRunner;
use crate::supervisor::SupervisorLimits;

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.bind`)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Delay added to every simulated driver call, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,
}

pub async fn cmd_serve(args: ServeArgs, config: AppConfig) -> Result<()> {
    let runner = SimulatedRunner::new(config.portal.clone(), config.pacing.clone(), config.policy.clone())
        .with_latency(std::time::Duration::from_millis(args.latency_ms));
    let manager = Arc::new(TaskManager::new(
        Arc::new(runner),
        config.tasks.manager.clone(),
    ));
    let janitor = manager.spawn_janitor(config.tasks.sweep_interval(), config.tasks.retention());

    let state = ServeState::new(Arc::clone(&manager), SupervisorLimits::from(&config.supervisor));
    let app = router(state);

    let bind = args.bind.unwrap_or(config.server.bind);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, "autofill server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    janitor.abort();
    info!("autofill server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for ctrl-c");
        futures::future::pending::<()>().await;
    }
}
