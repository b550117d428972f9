use std::sync::Arc;

use action_flow::{AutofillFlow, FlowContext, FlowExecutor, PacingConfig, PortalLayout, StepPolicy};
use async_trait::async_trait;
use autofill_core_types::{AutofillError, AutomationRequest, ProgressSink, TaskId};
use autofill_driver::DriverLauncher;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::instance::SessionSlot;

/// What the execution wrapper hands to a runner for one task.
pub struct RunContext {
    pub task_id: TaskId,
    pub request: Arc<AutomationRequest>,
    pub progress: Arc<dyn ProgressSink>,
    pub cancel: CancellationToken,
    /// The runner attaches its browser session here; the wrapper releases it.
    pub session: SessionSlot,
}

#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, ctx: RunContext) -> Result<(), AutofillError>;
}

/// Opens a browser session and drives the autofill pipeline through it.
pub struct FlowRunner {
    launcher: Arc<dyn DriverLauncher>,
    flow: Arc<dyn FlowExecutor>,
    portal: PortalLayout,
    pacing: PacingConfig,
    policy: StepPolicy,
}

impl FlowRunner {
    pub fn new(launcher: Arc<dyn DriverLauncher>) -> Self {
        Self {
            launcher,
            flow: Arc::new(AutofillFlow::new()),
            portal: PortalLayout::default(),
            pacing: PacingConfig::default(),
            policy: StepPolicy::default(),
        }
    }

    pub fn with_portal(mut self, portal: PortalLayout) -> Self {
        self.portal = portal;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_policy(mut self, policy: StepPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl TaskRunner for FlowRunner {
    async fn run(&self, ctx: RunContext) -> Result<(), AutofillError> {
        report(&ctx, "> Starting browser session");
        let driver = match self.launcher.new_session().await {
            Ok(driver) => driver,
            Err(err) => {
                let err = AutofillError::from(err);
                report(&ctx, &format!("launch session failed: {err}"));
                return Err(AutofillError::step("launch session", err));
            }
        };
        ctx.session.attach(driver.clone()).await;
        report(&ctx, "- Browser session started");

        let flow_ctx = FlowContext::new(ctx.task_id, driver, ctx.request, ctx.progress, ctx.cancel)
            .with_portal(self.portal.clone())
            .with_pacing(self.pacing.clone())
            .with_policy(self.policy.clone());
        self.flow.execute(&flow_ctx).await?;
        Ok(())
    }
}

/// Progress line mirrored into the log, like the pipeline's own lines.
fn report(ctx: &RunContext, line: &str) {
    info!(task_id = %ctx.task_id, "{line}");
    ctx.progress.emit(line);
}
