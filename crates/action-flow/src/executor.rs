//! Flow executor implementation

use async_trait::async_trait;
use autofill_core_types::AutofillError;
use tracing::{info, instrument};

use crate::context::FlowContext;
use crate::steps::{basic, detail, dialog, login, payment, save, upload};
use crate::types::{FlowReport, StepKind};

/// Flow executor trait
#[async_trait]
pub trait FlowExecutor: Send + Sync {
    /// Run the whole pipeline against the context's browser session.
    async fn execute(&self, ctx: &FlowContext) -> Result<FlowReport, AutofillError>;
}

/// The reimbursement autofill pipeline.
///
/// Steps run strictly in order: navigate, login, open dialog, basic info,
/// payment info, cost details, uploads, save. Cancellation is checked before
/// each of them and right after navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutofillFlow;

impl AutofillFlow {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FlowExecutor for AutofillFlow {
    #[instrument(name = "autofill.flow", skip_all, fields(task_id = %ctx.task_id))]
    async fn execute(&self, ctx: &FlowContext) -> Result<FlowReport, AutofillError> {
        let mut report = FlowReport::default();

        ctx.checkpoint("start")?;
        ctx.emit(format!("## Starting autofill task {}", ctx.task_id));
        ctx.attempt(&mut report, StepKind::Navigate, "navigate", login::navigate(ctx))
            .await?;
        ctx.checkpoint("after navigate")?;

        ctx.checkpoint("login")?;
        ctx.attempt(&mut report, StepKind::Login, "login", login::login(ctx))
            .await?;

        ctx.checkpoint("open dialog")?;
        ctx.attempt(&mut report, StepKind::OpenDialog, "open dialog", dialog::open(ctx))
            .await?;

        ctx.checkpoint("basic info")?;
        basic::fill(ctx, &mut report).await?;

        ctx.checkpoint("payment info")?;
        payment::fill(ctx, &mut report).await?;

        ctx.checkpoint("cost details")?;
        detail::fill(ctx, &mut report).await?;

        ctx.checkpoint("uploads")?;
        upload::attach(ctx, &mut report).await?;

        ctx.checkpoint("save")?;
        ctx.attempt(&mut report, StepKind::Save, "save", save::save(ctx))
            .await?;

        info!(
            task_id = %ctx.task_id,
            rows = report.rows_filled,
            files = report.files_uploaded,
            soft_failures = report.soft_failures.len(),
            "autofill pipeline finished"
        );
        ctx.emit("Reimbursement form filled and saved");
        Ok(report)
    }
}
