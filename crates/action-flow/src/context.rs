//! Per-run state shared by every pipeline step

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use action_locator::{CostColumn, TableResolver};
use autofill_core_types::{AutofillError, AutomationRequest, ProgressSink, TaskId};
use autofill_driver::{BrowserDriver, Locator};
use tokio_util::sync::CancellationToken;
use tool_select_option::{
    SelectOutcome, SelectParams, SelectPolicyView, SelectTimeouts, SelectTool, SelectToolBuilder,
};
use tracing::{debug, info, warn};

use crate::pacing::PacingConfig;
use crate::portal::PortalLayout;
use crate::types::{FailureStrategy, FlowReport, StepKind, StepPolicy};

/// Everything one pipeline run needs. The driver session is owned by the task,
/// the context only borrows it for the duration of the run.
pub struct FlowContext {
    pub task_id: TaskId,
    pub driver: Arc<dyn BrowserDriver>,
    pub request: Arc<AutomationRequest>,
    pub progress: Arc<dyn ProgressSink>,
    pub cancel: CancellationToken,
    pub portal: PortalLayout,
    pub pacing: PacingConfig,
    pub policy: StepPolicy,
}

impl FlowContext {
    pub fn new(
        task_id: TaskId,
        driver: Arc<dyn BrowserDriver>,
        request: Arc<AutomationRequest>,
        progress: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            task_id,
            driver,
            request,
            progress,
            cancel,
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

    /// Sends one progress line and mirrors it into the log.
    pub fn emit(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(task_id = %self.task_id, "{message}");
        self.progress.emit(message);
    }

    /// Cancellation checkpoint.
    pub fn checkpoint(&self, stage: &str) -> Result<(), AutofillError> {
        if self.cancel.is_cancelled() {
            info!(task_id = %self.task_id, stage, "cancellation observed");
            return Err(AutofillError::Cancelled);
        }
        Ok(())
    }

    /// Runs one unit of work under the policy for `kind`.
    ///
    /// A failure is always reported as a progress line. Soft failures resolve
    /// to `Ok(None)`; hard failures come back wrapped as
    /// [`AutofillError::StepFailed`]. Cancellation always propagates.
    pub async fn attempt<T, F>(
        &self,
        report: &mut FlowReport,
        kind: StepKind,
        label: &str,
        work: F,
    ) -> Result<Option<T>, AutofillError>
    where
        F: Future<Output = Result<T, AutofillError>>,
    {
        let err = match work.await {
            Ok(value) => return Ok(Some(value)),
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => err,
        };
        self.emit(format!("{label} failed: {err}"));
        match self.policy.strategy(kind) {
            FailureStrategy::Continue => {
                warn!(task_id = %self.task_id, step = %kind, error = %err, "soft failure, continuing");
                report.soft_failures.push((kind, err.to_string()));
                Ok(None)
            }
            FailureStrategy::Abort => Err(AutofillError::step(label, err)),
        }
    }

    pub async fn wait_visible(&self, locator: &Locator) -> Result<(), AutofillError> {
        self.driver
            .wait_for_visible(locator, self.pacing.wait_timeout())
            .await?;
        Ok(())
    }

    pub async fn click(&self, locator: &Locator) -> Result<(), AutofillError> {
        self.wait_visible(locator).await?;
        self.driver.click(locator).await?;
        Ok(())
    }

    pub async fn fill(&self, locator: &Locator, text: &str) -> Result<(), AutofillError> {
        self.wait_visible(locator).await?;
        self.driver.fill(locator, text).await?;
        Ok(())
    }

    /// Opens a dropdown through `trigger` and picks the option matching `target`.
    pub async fn select(
        &self,
        field: &str,
        trigger: Locator,
        options: Locator,
        target: &str,
    ) -> Result<SelectOutcome, AutofillError> {
        let params = SelectParams::new(field, options, target).with_trigger(trigger);
        let outcome = self
            .select_tool()
            .select(self.driver.as_ref(), &params, self.progress.as_ref())
            .await?;
        debug!(task_id = %self.task_id, field, outcome = ?outcome, "dropdown handled");
        Ok(outcome)
    }

    pub async fn resolve_cell(
        &self,
        row: usize,
        column: CostColumn,
    ) -> Result<Locator, AutofillError> {
        let resolver = TableResolver::new(self.portal.table.clone());
        let cell = resolver
            .resolve_cell(self.driver.as_ref(), row, column)
            .await?;
        Ok(cell)
    }

    /// Fixed delay for server-side effects; returns early on cancellation.
    pub async fn settle(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    /// Best-effort mouse-wheel scroll; failures are only logged.
    pub async fn scroll(&self, dy: i32) {
        if let Err(err) = self.driver.scroll(0.0, f64::from(dy)).await {
            warn!(task_id = %self.task_id, error = %err, "scroll failed");
        }
    }

    fn select_tool(&self) -> impl SelectTool {
        SelectToolBuilder::new(SelectPolicyView {
            fallback_to_first_visible: true,
            timeouts: SelectTimeouts {
                trigger_ms: self.pacing.wait_timeout_ms,
                options_ms: self.pacing.dropdown_timeout_ms,
            },
        })
        .build()
    }
}
