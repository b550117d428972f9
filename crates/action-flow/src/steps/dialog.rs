use autofill_core_types::AutofillError;

use crate::context::FlowContext;

pub async fn open(ctx: &FlowContext) -> Result<(), AutofillError> {
    ctx.emit("> Opening new reimbursement dialog");
    ctx.click(&ctx.portal.create_button()).await?;
    ctx.wait_visible(&ctx.portal.dialog()).await?;
    ctx.emit("- Reimbursement dialog opened");
    Ok(())
}
