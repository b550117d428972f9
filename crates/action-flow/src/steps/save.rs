use autofill_core_types::AutofillError;

use crate::context::FlowContext;

pub async fn save(ctx: &FlowContext) -> Result<(), AutofillError> {
    ctx.emit("## Saving");
    ctx.scroll(-ctx.pacing.scroll_delta).await;
    ctx.click(&ctx.portal.save_button()).await?;
    ctx.settle(ctx.pacing.after_save()).await;
    ctx.emit("- Saved");
    Ok(())
}
