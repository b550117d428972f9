//! Runner backed by the scripted portal
//!
//! Each task gets a fresh simulated page prepared for its own request, so the
//! whole pipeline can be exercised without a browser.

use std::sync::Arc;
use std::time::Duration;

use action_flow::fixture::simulated_portal;
use action_flow::{PacingConfig, PortalLayout, StepPolicy};
use async_trait::async_trait;
use autofill_core_types::AutofillError;
use autofill_driver::scripted::ScriptedLauncher;
use autofill_scheduler::{FlowRunner, RunContext, TaskRunner};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SimulatedRunner {
    portal: PortalLayout,
    pacing: PacingConfig,
    policy: StepPolicy,
    latency: Duration,
}

impl SimulatedRunner {
    pub fn new(portal: PortalLayout, pacing: PacingConfig, policy: StepPolicy) -> Self {
        Self {
            portal,
            pacing,
            policy,
            latency: Duration::ZERO,
        }
    }

    /// Delay added to every simulated driver call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl TaskRunner for SimulatedRunner {
    async fn run(&self, ctx: RunContext) -> Result<(), AutofillError> {
        let page = simulated_portal(&self.portal, &ctx.request).with_latency(self.latency);
        debug!(task_id = %ctx.task_id, latency_ms = self.latency.as_millis() as u64, "simulated portal prepared");
        let launcher = ScriptedLauncher::shared(Arc::new(page));
        FlowRunner::new(Arc::new(launcher))
            .with_portal(self.portal.clone())
            .with_pacing(self.pacing.clone())
            .with_policy(self.policy.clone())
            .run(ctx)
            .await
    }
}
