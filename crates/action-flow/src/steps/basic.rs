use autofill_core_types::AutofillError;

use crate::context::FlowContext;
use crate::types::{FlowReport, StepKind};

/// Category, urgency and comment. Each sub-field is its own unit of work.
pub async fn fill(ctx: &FlowContext, report: &mut FlowReport) -> Result<(), AutofillError> {
    let basic = &ctx.request.basic;
    let portal = &ctx.portal;
    ctx.emit("## Basic info");

    ctx.emit(format!("- Setting reimbursement category: {}", basic.category));
    ctx.attempt(
        report,
        StepKind::BasicField,
        "reimbursement category",
        ctx.select(
            "reimbursement category",
            portal.category(),
            portal.options(),
            &basic.category,
        ),
    )
    .await?;

    // Urgency options render as plain text and must match exactly.
    ctx.emit(format!("- Setting urgency: {}", basic.urgency));
    ctx.attempt(
        report,
        StepKind::BasicField,
        "urgency",
        ctx.select(
            "urgency",
            portal.urgency(),
            portal.text_options(&basic.urgency, true),
            &basic.urgency,
        ),
    )
    .await?;

    ctx.emit(format!("- Setting comment: {}", basic.comment));
    ctx.attempt(
        report,
        StepKind::BasicField,
        "comment",
        ctx.fill(&portal.comment(), &basic.comment),
    )
    .await?;

    ctx.emit("- Basic info done");
    Ok(())
}
