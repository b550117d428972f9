//! Progress supervisor: relays one task's progress lines to a consumer.
//!
//! The supervisor owns the absolute deadline and the heartbeat for a stream.
//! Every way of giving up on a task (client disconnect, deadline, a failing
//! sink) goes through `cancel_task` so the browser session is released.

use std::time::Duration;

use async_trait::async_trait;
use autofill_core_types::TaskId;
use autofill_scheduler::{SchedulerError, TaskManager, TaskSnapshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::SupervisorConfig;

/// The consumer went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("progress consumer disconnected")]
pub struct SinkClosed;

/// Where supervised lines end up.
#[async_trait]
pub trait LineSink: Send + Sync {
    async fn send_line(&self, line: String) -> Result<(), SinkClosed>;

    /// Sent after `heartbeat` of silence.
    async fn keepalive(&self) -> Result<(), SinkClosed>;

    /// Resolves when the consumer has gone away. Sinks that cannot tell never resolve.
    async fn closed(&self) {
        futures::future::pending::<()>().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// The channel closed on its own; carries the final snapshot.
    Completed(TaskSnapshot),
    Disconnected,
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub struct SupervisorLimits {
    pub deadline: Duration,
    pub heartbeat: Duration,
}

impl From<&SupervisorConfig> for SupervisorLimits {
    fn from(config: &SupervisorConfig) -> Self {
        Self {
            deadline: config.deadline(),
            heartbeat: config.heartbeat(),
        }
    }
}

/// Streams the progress of `id` into `sink` until the task finishes or the
/// stream is abandoned.
///
/// `disconnect` is the external "consumer is gone" signal; the sink's own
/// `closed` future is raced alongside it.
#[instrument(name = "autofill.supervise", skip_all, fields(task_id = %id))]
pub async fn supervise(
    manager: &TaskManager,
    id: &TaskId,
    sink: &dyn LineSink,
    disconnect: CancellationToken,
    limits: SupervisorLimits,
) -> Result<SupervisorOutcome, SchedulerError> {
    let receiver = manager
        .progress_channel(id)
        .ok_or_else(|| SchedulerError::UnknownTask(id.to_string()))?;

    let deadline = tokio::time::sleep(limits.deadline);
    tokio::pin!(deadline);
    let mut heartbeat = interval_at(Instant::now() + limits.heartbeat, limits.heartbeat);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = disconnect.cancelled() => {
                info!("consumer disconnected");
                return Ok(abandon(manager, id, SupervisorOutcome::Disconnected));
            }
            _ = sink.closed() => {
                info!("consumer closed the stream");
                return Ok(abandon(manager, id, SupervisorOutcome::Disconnected));
            }
            _ = &mut deadline => {
                warn!(deadline_secs = limits.deadline.as_secs(), "task exceeded its deadline");
                return Ok(abandon(manager, id, SupervisorOutcome::TimedOut));
            }
            line = receiver.recv() => match line {
                Some(line) => {
                    heartbeat.reset();
                    if sink.send_line(line).await.is_err() {
                        return Ok(abandon(manager, id, SupervisorOutcome::Disconnected));
                    }
                }
                None => break,
            },
            _ = heartbeat.tick() => {
                debug!("heartbeat");
                if sink.keepalive().await.is_err() {
                    return Ok(abandon(manager, id, SupervisorOutcome::Disconnected));
                }
            }
        }
    }

    let snapshot = manager.wait_for_completion(id).await?;
    info!(status = %snapshot.status, "progress stream finished");
    Ok(SupervisorOutcome::Completed(snapshot))
}

fn abandon(manager: &TaskManager, id: &TaskId, outcome: SupervisorOutcome) -> SupervisorOutcome {
    let cancelled = manager.cancel_task(id);
    debug!(cancelled, outcome = ?outcome, "stream abandoned");
    outcome
}
