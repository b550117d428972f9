use autofill_core_types::AutofillError;
use autofill_driver::Locator;

use crate::context::FlowContext;
use crate::types::{FlowReport, StepKind};

pub async fn fill(ctx: &FlowContext, report: &mut FlowReport) -> Result<(), AutofillError> {
    let payment = &ctx.request.payment;
    let portal = &ctx.portal;
    ctx.emit("## Payment info");
    ctx.scroll(ctx.pacing.scroll_delta).await;

    let mut fields: Vec<(&str, Locator, &str)> = vec![
        ("business department", portal.business_dept(), payment.business_dept.as_str()),
        ("budget department", portal.budget_dept(), payment.budget_dept.as_str()),
        ("project type", portal.project_type(), payment.project_type.as_str()),
    ];
    if let Some(project) = payment.project.as_deref() {
        fields.push(("project", portal.project(), project));
    }
    fields.push(("pay company", portal.pay_company(), payment.pay_company.as_str()));

    for (field, trigger, value) in fields {
        ctx.emit(format!("- Setting {field}: {value}"));
        ctx.attempt(
            report,
            StepKind::PaymentField,
            field,
            ctx.select(field, trigger, portal.options(), value),
        )
        .await?;
    }

    ctx.emit("- Payment info done");
    Ok(())
}
